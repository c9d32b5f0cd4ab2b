//! Planner session: the working map plus the results of the latest run
//!
//! A calculate invocation has two phases, terrain scanning and portal
//! optimization, which callers can drive separately to report progress in
//! between. Results only reach the session through `commit`, and only when
//! the run's ticket is still the newest one; a superseded run's output is
//! dropped rather than merged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbImage;
use rand::Rng;
use tracing::{info, warn};

use crate::clustering::{constrained_kmeans, ClusterOutcome};
use crate::error::{PlannerError, Result};
use crate::params::PlannerParams;
use crate::portal::{portals_from_centroids, Portal};
use crate::source::MapSource;
use crate::terrain::{scan_terrain, TerrainScan};

/// Progress reported while a calculate invocation runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Optimizing { portals: usize },
    Complete,
}

impl Phase {
    pub fn status_text(&self) -> String {
        match self {
            Phase::Scanning => "Scanning terrain geometry...".to_string(),
            Phase::Optimizing { portals } => format!("Optimizing locations for {} portals...", portals),
            Phase::Complete => "Optimization Complete!".to_string(),
        }
    }
}

/// Identifies one calculate invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
}

/// Shared view of a session's run generation, usable from other threads
#[derive(Clone, Debug)]
pub struct RunHandle {
    generation: Arc<AtomicU64>,
}

impl RunHandle {
    /// Mark whatever run is in flight as stale.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }
}

/// Portals produced by one run, with the figures behind them
#[derive(Clone, Debug)]
pub struct Placement {
    pub portals: Vec<Portal>,
    pub outcome: ClusterOutcome,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub land_points: usize,
    /// Share of working pixels classified as land
    pub land_fraction: f64,
    pub used_fallback_grid: bool,
}

/// Owns the working map and the state of the latest committed run
pub struct PlannerSession {
    params: PlannerParams,
    source: MapSource,
    working: RgbImage,
    scan: Option<TerrainScan>,
    placement: Option<Placement>,
    generation: Arc<AtomicU64>,
}

impl PlannerSession {
    pub fn new(source: MapSource, params: PlannerParams) -> Result<Self> {
        params.validate()?;
        let working = source.working_image(params.max_width);
        info!(
            "Map loaded from {}: {}x{} working resolution",
            source.origin,
            working.width(),
            working.height()
        );
        Ok(Self {
            params,
            source,
            working,
            scan: None,
            placement: None,
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Replace the map. Any run in flight is superseded and prior results are dropped.
    pub fn load_map(&mut self, source: MapSource) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.working = source.working_image(self.params.max_width);
        self.source = source;
        self.scan = None;
        self.placement = None;
        info!(
            "Map loaded from {}: {}x{} working resolution",
            self.source.origin,
            self.working.width(),
            self.working.height()
        );
    }

    pub fn params(&self) -> &PlannerParams {
        &self.params
    }

    pub fn source(&self) -> &MapSource {
        &self.source
    }

    /// The image all coordinates refer to.
    pub fn working_image(&self) -> &RgbImage {
        &self.working
    }

    /// Terrain of the latest committed run.
    pub fn terrain(&self) -> Option<&TerrainScan> {
        self.scan.as_ref()
    }

    /// Placement of the latest committed run.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Portals of the latest committed run; empty before the first run.
    pub fn portals(&self) -> &[Portal] {
        self.placement.as_ref().map(|p| p.portals.as_slice()).unwrap_or(&[])
    }

    pub fn handle(&self) -> RunHandle {
        RunHandle {
            generation: Arc::clone(&self.generation),
        }
    }

    /// Start a new run: supersede any other and clear the previous results.
    pub fn begin_run(&mut self) -> RunTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.scan = None;
        self.placement = None;
        RunTicket { generation }
    }

    /// Phase one: classify the working image.
    pub fn scan_terrain(&self) -> Result<TerrainScan> {
        scan_terrain(&self.working, &self.params)
    }

    /// Phase two: place `k` portals over a scanned terrain.
    pub fn optimize<R: Rng + ?Sized>(
        &self,
        scan: &TerrainScan,
        k: usize,
        rng: &mut R,
    ) -> Result<Placement> {
        let outcome = constrained_kmeans(&scan.land_points, k, &self.params, rng)?;
        let portals = portals_from_centroids(&outcome.centroids, scan.width, scan.height);
        Ok(Placement {
            portals,
            outcome,
            width: scan.width,
            height: scan.height,
            stride: scan.stride,
            land_points: scan.land_points.len(),
            land_fraction: scan.land_fraction(),
            used_fallback_grid: scan.used_fallback_grid,
        })
    }

    /// Store a run's results if it is still the newest run.
    ///
    /// Returns `false` and discards the results when the ticket is stale.
    pub fn commit(&mut self, ticket: RunTicket, scan: TerrainScan, placement: Placement) -> bool {
        if !self.handle().is_current(ticket) {
            warn!("Discarding results of a superseded run");
            return false;
        }
        self.scan = Some(scan);
        self.placement = Some(placement);
        true
    }

    /// Run both phases for `k` portals, reporting each phase to `progress`.
    ///
    /// Returns `Ok(None)` if another run superseded this one before it
    /// finished.
    pub fn calculate<R: Rng + ?Sized>(
        &mut self,
        k: usize,
        rng: &mut R,
        mut progress: impl FnMut(Phase),
    ) -> Result<Option<&Placement>> {
        if k == 0 {
            return Err(PlannerError::InvalidPortalCount(k));
        }
        let ticket = self.begin_run();

        progress(Phase::Scanning);
        let scan = self.scan_terrain()?;

        progress(Phase::Optimizing { portals: k });
        let placement = self.optimize(&scan, k, rng)?;

        if !self.commit(ticket, scan, placement) {
            return Ok(None);
        }
        progress(Phase::Complete);
        Ok(self.placement.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn archipelago() -> MapSource {
        let img = RgbImage::from_fn(160, 120, |x, y| {
            let west = (20..60).contains(&x) && (20..100).contains(&y);
            let east = (100..140).contains(&x) && (30..70).contains(&y);
            if west || east { Rgb([140, 170, 90]) } else { Rgb([35, 80, 160]) }
        });
        MapSource::from_image(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn test_calculate_reports_both_phases() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut phases = Vec::new();

        let placement = session.calculate(4, &mut rng, |p| phases.push(p)).unwrap().unwrap();
        assert_eq!(placement.portals.len(), 4);
        assert_eq!(
            phases,
            vec![Phase::Scanning, Phase::Optimizing { portals: 4 }, Phase::Complete]
        );
        assert_eq!(session.portals().len(), 4);
        assert!(session.terrain().is_some());
    }

    #[test]
    fn test_portals_sit_on_land_pixels() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        session.calculate(6, &mut rng, |_| {}).unwrap();

        let scan = session.terrain().unwrap();
        for portal in session.portals() {
            let p = portal.position;
            assert!(scan.mask.get(p.x as usize, p.y as usize).is_land());
        }
    }

    #[test]
    fn test_zero_portals_rejected_without_running() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut called = false;

        let result = session.calculate(0, &mut rng, |_| called = true);
        assert!(matches!(result, Err(PlannerError::InvalidPortalCount(0))));
        assert!(!called);
    }

    #[test]
    fn test_new_run_clears_previous_results() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        session.calculate(3, &mut rng, |_| {}).unwrap();
        assert_eq!(session.portals().len(), 3);

        session.begin_run();
        assert!(session.portals().is_empty());
        assert!(session.terrain().is_none());
    }

    #[test]
    fn test_stale_run_is_discarded() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let stale = session.begin_run();
        let scan = session.scan_terrain().unwrap();
        let placement = session.optimize(&scan, 2, &mut rng).unwrap();

        // A newer run starts before the first one commits
        let fresh = session.begin_run();
        assert!(!session.commit(stale, scan.clone(), placement.clone()));
        assert!(session.portals().is_empty());

        assert!(session.commit(fresh, scan, placement));
        assert_eq!(session.portals().len(), 2);
    }

    #[test]
    fn test_handle_invalidates_in_flight_run() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let handle = session.handle();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let result = session
            .calculate(3, &mut rng, |phase| {
                if phase == Phase::Scanning {
                    handle.invalidate();
                }
            })
            .unwrap();
        assert!(result.is_none());
        assert!(session.portals().is_empty());
    }

    #[test]
    fn test_load_map_resets_state() {
        let mut session = PlannerSession::new(archipelago(), PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        session.calculate(2, &mut rng, |_| {}).unwrap();

        let water = RgbImage::from_pixel(30, 30, Rgb([10, 40, 90]));
        session.load_map(MapSource::from_image(DynamicImage::ImageRgb8(water)));
        assert!(session.placement().is_none());
        assert_eq!(session.working_image().dimensions(), (30, 30));

        // All-water map still yields portals through the fallback grid
        let placement = session.calculate(3, &mut rng, |_| {}).unwrap().unwrap();
        assert!(placement.used_fallback_grid);
        assert_eq!(placement.land_fraction, 0.0);
        assert_eq!(placement.portals.len(), 3);
    }

    #[test]
    fn test_empty_working_image_fails_cleanly() {
        let source = MapSource::from_image(DynamicImage::ImageRgb8(RgbImage::new(0, 0)));
        let mut session = PlannerSession::new(source, PlannerParams::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let result = session.calculate(2, &mut rng, |_| {});
        assert!(matches!(result, Err(PlannerError::PixelAccess(_))));
        assert!(session.portals().is_empty());
    }

    #[test]
    fn test_phase_status_text() {
        assert_eq!(Phase::Scanning.status_text(), "Scanning terrain geometry...");
        assert_eq!(
            Phase::Optimizing { portals: 12 }.status_text(),
            "Optimizing locations for 12 portals..."
        );
    }
}
