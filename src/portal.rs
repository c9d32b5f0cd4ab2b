//! Final portal placements and their display coordinates
//!
//! Display coordinates map each axis of the working image onto 0–1000
//! (origin top-left), so 755 means 75.5% of the way across.

use serde::{Deserialize, Serialize};

use crate::terrain::LandPoint;

/// Upper end of the normalized coordinate range
pub const NORMALIZED_RANGE: u32 = 1000;

/// Position on the 0–1000 display grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCoord {
    pub x: u32,
    pub y: u32,
}

impl NormalizedCoord {
    /// Zero-padded display strings, e.g. `("075", "1000")`.
    pub fn display(&self) -> (String, String) {
        (format_axis(self.x), format_axis(self.y))
    }
}

/// Scale one coordinate onto 0–1000 and clamp.
pub fn normalize_axis(value: f64, extent: u32) -> u32 {
    if extent == 0 || !value.is_finite() {
        return 0;
    }
    let scaled = (value / extent as f64 * NORMALIZED_RANGE as f64).round();
    scaled.clamp(0.0, NORMALIZED_RANGE as f64) as u32
}

/// Normalize a working-space position against a `width` x `height` image.
pub fn normalize(x: f64, y: f64, width: u32, height: u32) -> NormalizedCoord {
    NormalizedCoord {
        x: normalize_axis(x, width),
        y: normalize_axis(y, height),
    }
}

/// Three-digit zero padded axis value.
pub fn format_axis(value: u32) -> String {
    format!("{:03}", value)
}

/// A placed portal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    /// 1-based position in the result list
    pub index: usize,
    /// Snapped position in working image space
    pub position: LandPoint,
    pub normalized: NormalizedCoord,
}

impl Portal {
    pub fn new(index: usize, position: LandPoint, width: u32, height: u32) -> Self {
        Self {
            index,
            position,
            normalized: normalize(position.x as f64, position.y as f64, width, height),
        }
    }

    /// Readout line, e.g. `3. [X: 755, Y: 090]`.
    pub fn label(&self) -> String {
        let (x, y) = self.normalized.display();
        format!("{}. [X: {}, Y: {}]", self.index, x, y)
    }
}

/// Build portals from snapped centroids, numbering from 1.
pub fn portals_from_centroids(centroids: &[LandPoint], width: u32, height: u32) -> Vec<Portal> {
    centroids
        .iter()
        .enumerate()
        .map(|(i, &c)| Portal::new(i + 1, c, width, height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_matches_percentage() {
        assert_eq!(normalize_axis(755.0, 1000), 755);
        assert_eq!(normalize_axis(151.0, 200), 755);
        assert_eq!(normalize_axis(0.0, 640), 0);
    }

    #[test]
    fn test_normalize_boundaries() {
        // x = W - 1 rounds to just under the top of the range
        assert_eq!(normalize_axis(999.0, 1000), 999);
        assert_eq!(normalize_axis(99.0, 100), 990);
        assert_eq!(normalize_axis(2999.0, 3000), 1000);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        assert_eq!(normalize_axis(-25.0, 100), 0);
        assert_eq!(normalize_axis(250.0, 100), 1000);
        assert_eq!(normalize_axis(f64::NAN, 100), 0);
        assert_eq!(normalize_axis(10.0, 0), 0);
    }

    #[test]
    fn test_normalize_rounds_half_up() {
        // 1/16 of the range is exactly 62.5
        assert_eq!(normalize_axis(1.0, 16), 63);
        assert_eq!(normalize(1.0, 3.0, 8, 8), NormalizedCoord { x: 125, y: 375 });
    }

    #[test]
    fn test_format_axis_pads() {
        assert_eq!(format_axis(0), "000");
        assert_eq!(format_axis(75), "075");
        assert_eq!(format_axis(755), "755");
        assert_eq!(format_axis(1000), "1000");
    }

    #[test]
    fn test_portal_label() {
        let portals = portals_from_centroids(
            &[LandPoint::new(151, 18), LandPoint::new(0, 199)],
            200,
            200,
        );
        assert_eq!(portals[0].label(), "1. [X: 755, Y: 090]");
        assert_eq!(portals[1].label(), "2. [X: 000, Y: 995]");
    }
}
