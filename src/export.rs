//! JSON report of a placement run

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::session::Placement;

/// One portal as written to the report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalRecord {
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub normalized_x: u32,
    pub normalized_y: u32,
    pub label: String,
}

/// Everything needed to reproduce and display one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementReport {
    pub generated_at: String,
    pub map: String,
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub land_points: usize,
    pub land_fraction: f64,
    pub used_fallback_grid: bool,
    pub iterations: usize,
    pub converged: bool,
    pub cluster_sizes: Vec<usize>,
    pub portals: Vec<PortalRecord>,
}

impl PlacementReport {
    pub fn new(placement: &Placement, map: &str, seed: Option<u64>) -> Self {
        let portals = placement
            .portals
            .iter()
            .map(|p| PortalRecord {
                index: p.index,
                x: p.position.x,
                y: p.position.y,
                normalized_x: p.normalized.x,
                normalized_y: p.normalized.y,
                label: p.label(),
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            map: map.to_string(),
            seed,
            width: placement.width,
            height: placement.height,
            stride: placement.stride,
            land_points: placement.land_points,
            land_fraction: placement.land_fraction,
            used_fallback_grid: placement.used_fallback_grid,
            iterations: placement.outcome.iterations,
            converged: placement.outcome.converged,
            cluster_sizes: placement.outcome.cluster_sizes.clone(),
            portals,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlannerError::Export(e.to_string()))
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| PlannerError::Export(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}
