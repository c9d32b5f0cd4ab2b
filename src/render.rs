//! Portal overlay and terrain mask rendering
//!
//! The overlay draws each portal as a pulsing blue glow with either the
//! portal icon or a red marker on top. Animation is the caller's business:
//! pass a pulse from `pulse_at` per frame, or `PEAK_PULSE` for a still.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{PlannerError, Result};
use crate::portal::Portal;
use crate::terrain::TerrainScan;

/// Glow radius around each portal (pixels)
pub const GLOW_RADIUS: f32 = 34.0;
/// Portal icon edge length (pixels)
pub const ICON_SIZE: u32 = 23;
/// Fallback marker radius (pixels)
pub const MARKER_RADIUS: f32 = 8.0;
/// Fallback marker outline width (pixels)
pub const MARKER_STROKE: f32 = 2.0;
/// Brightest point of the pulse cycle
pub const PEAK_PULSE: f32 = 0.7;

const MARKER_FILL: [u8; 3] = [0xe7, 0x4c, 0x3c];
const MARKER_OUTLINE: [u8; 3] = [255, 255, 255];

/// Glow gradient stops: (offset, color, alpha factor)
const GLOW_STOPS: [(f32, [u8; 3], f32); 4] = [
    (0.0, [100, 180, 255], 0.85),
    (0.35, [70, 140, 235], 0.6),
    (0.65, [50, 110, 200], 0.3),
    (1.0, [40, 80, 180], 0.0),
];

const MASK_LAND: Rgb<u8> = Rgb([118, 160, 88]);
const MASK_WATER: Rgb<u8> = Rgb([38, 78, 148]);
const MASK_SAMPLE: Rgb<u8> = Rgb([255, 240, 120]);

/// Glow strength at time `t_ms` milliseconds, cycling between 0 and 0.7.
pub fn pulse_at(t_ms: f64) -> f32 {
    (0.35 + 0.35 * (t_ms * 0.004).sin()) as f32
}

/// Options for drawing portals
#[derive(Clone, Debug)]
pub struct OverlayStyle {
    /// Glow intensity, usually from `pulse_at`
    pub pulse: f32,
    /// Icon drawn at each portal; a red marker is used when absent
    pub icon: Option<RgbaImage>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            pulse: PEAK_PULSE,
            icon: None,
        }
    }
}

impl OverlayStyle {
    /// Load and scale a portal icon.
    pub fn with_icon_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let icon = image::open(path)
            .map_err(|e| PlannerError::ImageLoad(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        self.icon = Some(imageops::resize(&icon, ICON_SIZE, ICON_SIZE, FilterType::Triangle));
        Ok(self)
    }
}

/// Blend `color` over `pixel` with coverage `alpha` (0-1).
fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let src = color[c] as f32;
        let dst = pixel.0[c] as f32;
        pixel.0[c] = (src * a + dst * (1.0 - a)).round() as u8;
    }
    let dst_a = pixel.0[3] as f32 / 255.0;
    pixel.0[3] = ((a + dst_a * (1.0 - a)) * 255.0).round() as u8;
}

/// Color and alpha of the glow gradient at `t` (0 at the center, 1 at the rim).
fn glow_sample(t: f32, pulse: f32) -> ([u8; 3], f32) {
    for pair in GLOW_STOPS.windows(2) {
        let (t0, c0, a0) = pair[0];
        let (t1, c1, a1) = pair[1];
        if t <= t1 {
            let f = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            let color = [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])];
            return (color, pulse * (a0 + (a1 - a0) * f));
        }
    }
    (GLOW_STOPS[3].1, 0.0)
}

/// Visit pixels within `radius` of `(cx, cy)` with their distance.
fn for_each_in_radius(
    img: &mut RgbaImage,
    cx: f32,
    cy: f32,
    radius: f32,
    mut f: impl FnMut(&mut Rgba<u8>, f32),
) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(width - 1);
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d <= radius {
                f(img.get_pixel_mut(x, y), d);
            }
        }
    }
}

fn draw_glow(img: &mut RgbaImage, cx: f32, cy: f32, pulse: f32) {
    for_each_in_radius(img, cx, cy, GLOW_RADIUS, |pixel, d| {
        let (color, alpha) = glow_sample(d / GLOW_RADIUS, pulse);
        blend(pixel, color, alpha);
    });
}

fn draw_marker(img: &mut RgbaImage, cx: f32, cy: f32) {
    let inner = MARKER_RADIUS - MARKER_STROKE / 2.0;
    let outer = MARKER_RADIUS + MARKER_STROKE / 2.0;
    for_each_in_radius(img, cx, cy, outer, |pixel, d| {
        let color = if d <= inner { MARKER_FILL } else { MARKER_OUTLINE };
        blend(pixel, color, 1.0);
    });
}

/// Draw portals over the working map.
pub fn render_overlay(map: &RgbImage, portals: &[Portal], style: &OverlayStyle) -> RgbaImage {
    let mut img = RgbaImage::from_fn(map.width(), map.height(), |x, y| {
        let Rgb([r, g, b]) = *map.get_pixel(x, y);
        Rgba([r, g, b, 255])
    });

    for portal in portals {
        let cx = portal.position.x as f32;
        let cy = portal.position.y as f32;
        draw_glow(&mut img, cx, cy, style.pulse);
        match &style.icon {
            Some(icon) => {
                let left = portal.position.x as i64 - icon.width() as i64 / 2;
                let top = portal.position.y as i64 - icon.height() as i64 / 2;
                imageops::overlay(&mut img, icon, left, top);
            }
            None => draw_marker(&mut img, cx, cy),
        }
    }

    img
}

/// Land/water classification with the sampled points highlighted.
pub fn render_terrain_mask(scan: &TerrainScan) -> RgbImage {
    let mut img = RgbImage::new(scan.width, scan.height);
    for (x, y, terrain) in scan.mask.iter() {
        let color = if terrain.is_land() { MASK_LAND } else { MASK_WATER };
        img.put_pixel(x as u32, y as u32, color);
    }
    for p in &scan.land_points {
        img.put_pixel(p.x, p.y, MASK_SAMPLE);
    }
    img
}

/// Save a rendered image; the format follows the file extension.
pub fn save_image(img: impl Into<DynamicImage>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    img.into()
        .save(path)
        .map_err(|e| PlannerError::Export(format!("{}: {}", path.display(), e)))
}
