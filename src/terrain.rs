//! Terrain classification
//!
//! Splits a working map image into land and water by color. The top-left
//! pixel is taken as the water color; anything far enough from it in RGB
//! space is land. Land is sampled on a regular stride so the clustering
//! engine works on a few thousand points regardless of map size.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PlannerError, Result};
use crate::params::PlannerParams;
use crate::tilemap::Tilemap;

/// Classification of a single pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Terrain {
    #[default]
    Water,
    Land,
}

impl Terrain {
    pub fn is_land(&self) -> bool {
        matches!(self, Terrain::Land)
    }
}

/// A sampled land coordinate in working image space (origin top-left)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LandPoint {
    pub x: u32,
    pub y: u32,
}

impl LandPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared distance to an arbitrary position.
    pub fn dist_sq(&self, x: f64, y: f64) -> f64 {
        let dx = self.x as f64 - x;
        let dy = self.y as f64 - y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another land point.
    pub fn distance(&self, other: &LandPoint) -> f64 {
        self.dist_sq(other.x as f64, other.y as f64).sqrt()
    }
}

/// Result of one classification pass
#[derive(Clone, Debug)]
pub struct TerrainScan {
    pub width: u32,
    pub height: u32,
    /// Sampling step in both axes
    pub stride: usize,
    /// Reference water color, read from pixel (0, 0)
    pub water_color: [u8; 3],
    /// Sampled land points in row-major order
    pub land_points: Vec<LandPoint>,
    /// Land pixels at full working resolution
    pub land_pixels: usize,
    /// True when no land was found and every strided position was used instead
    pub used_fallback_grid: bool,
    /// Per-pixel classification
    pub mask: Tilemap<Terrain>,
}

impl TerrainScan {
    /// Fraction of working pixels classified as land.
    pub fn land_fraction(&self) -> f64 {
        let total = self.width as f64 * self.height as f64;
        if total == 0.0 { 0.0 } else { self.land_pixels as f64 / total }
    }
}

/// Euclidean distance between two colors in RGB space.
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f64 {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Sampling stride that keeps roughly `sample_budget` positions.
pub fn sampling_stride(total_pixels: usize, sample_budget: usize, min_stride: usize) -> usize {
    let budget = sample_budget.max(1) as f64;
    let step = (total_pixels as f64 / budget).sqrt().floor() as usize;
    step.max(min_stride).max(1)
}

/// Classify a working image into land and water and sample the land.
pub fn scan_terrain(image: &RgbImage, params: &PlannerParams) -> Result<TerrainScan> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PlannerError::PixelAccess(
            "map not ready, the working image is empty".into(),
        ));
    }

    let water_color = image.get_pixel(0, 0).0;
    let total_pixels = width as usize * height as usize;
    let stride = sampling_stride(total_pixels, params.sample_budget, params.min_stride);

    let mut mask = Tilemap::new_with(width as usize, height as usize, Terrain::Water);
    let mut land_points = Vec::new();
    let mut land_pixels = 0usize;

    for (x, y, pixel) in image.enumerate_pixels() {
        if color_distance(pixel.0, water_color) > params.water_distance {
            mask.set(x as usize, y as usize, Terrain::Land);
            land_pixels += 1;
            if x as usize % stride == 0 && y as usize % stride == 0 {
                land_points.push(LandPoint::new(x, y));
            }
        }
    }

    let used_fallback_grid = land_points.is_empty();
    if used_fallback_grid {
        warn!(
            "No pixel differs from water color {:?}; falling back to a uniform grid",
            water_color
        );
        land_points = fallback_grid(width, height, stride);
    }

    debug!(
        "Terrain scan: {} land pixels, stride {}, {} sampled points",
        land_pixels,
        stride,
        land_points.len()
    );
    info!(
        "Scanned {}x{} map: {:.1}% land, {} candidate points",
        width,
        height,
        100.0 * land_pixels as f64 / total_pixels as f64,
        land_points.len()
    );

    Ok(TerrainScan {
        width,
        height,
        stride,
        water_color,
        land_points,
        land_pixels,
        used_fallback_grid,
        mask,
    })
}

/// Every strided position, row-major.
fn fallback_grid(width: u32, height: u32, stride: usize) -> Vec<LandPoint> {
    (0..height)
        .step_by(stride)
        .flat_map(|y| (0..width).step_by(stride).map(move |x| LandPoint::new(x, y)))
        .collect()
}
