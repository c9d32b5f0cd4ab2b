//! Map image loading
//!
//! Maps arrive either as an image file or as an embedded
//! `data:image/...;base64,` URI. Both are decoded with the `image` crate and
//! reduced to an RGB working image no wider than the configured maximum.

use std::path::Path;

use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::error::{PlannerError, Result};

/// A decoded map image at its original resolution
#[derive(Clone, Debug)]
pub struct MapSource {
    image: DynamicImage,
    /// Where the map came from, for status messages
    pub origin: String,
}

impl MapSource {
    /// Load a map from a path or an embedded data URI.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim_start().starts_with("data:") {
            Self::from_data_uri(input)
        } else {
            Self::from_path(input)
        }
    }

    /// Read and decode an image file. The format is guessed from content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| PlannerError::ImageLoad(format!("{}: {}", path.display(), e)))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| PlannerError::ImageLoad(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            image,
            origin: path.display().to_string(),
        })
    }

    /// Decode a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PlannerError::ImageLoad("not a data URI".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| PlannerError::ImageLoad("data URI has no payload".into()))?;
        if !header.ends_with(";base64") {
            return Err(PlannerError::ImageLoad(format!(
                "unsupported data URI encoding '{}'",
                header
            )));
        }

        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| PlannerError::ImageLoad(format!("base64 decode error: {}", e)))?;
        let image = image::load_from_memory(&bytes)?;

        let mime = header.trim_end_matches(";base64");
        Ok(Self {
            image,
            origin: format!("embedded {}", if mime.is_empty() { "image" } else { mime }),
        })
    }

    /// Wrap an already decoded image.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            origin: "in-memory image".into(),
        }
    }

    /// Original (width, height) before any downscaling.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Produce the RGB image all coordinates are measured in.
    ///
    /// Images wider than `max_width` are resized to exactly `max_width` wide,
    /// keeping the aspect ratio with the height truncated. Narrower images
    /// are used as-is.
    pub fn working_image(&self, max_width: u32) -> RgbImage {
        let (width, height) = self.image.dimensions();
        if max_width > 0 && width > max_width {
            let scale = max_width as f64 / width as f64;
            let new_height = ((height as f64 * scale).floor() as u32).max(1);
            self.image
                .resize_exact(max_width, new_height, FilterType::Triangle)
                .to_rgb8()
        } else {
            self.image.to_rgb8()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb([20, 60, 140]) } else { Rgb([90, 160, 70]) }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(8, 6));
        let uri = format!("data:image/png;base64,{}", encoded);

        let source = MapSource::parse(&uri).unwrap();
        assert_eq!(source.dimensions(), (8, 6));
        assert_eq!(source.origin, "embedded image/png");
    }

    #[test]
    fn test_data_uri_rejects_plain_encoding() {
        let result = MapSource::from_data_uri("data:text/plain,hello");
        assert!(matches!(result, Err(PlannerError::ImageLoad(_))));
    }

    #[test]
    fn test_garbage_payload_is_load_error() {
        let result = MapSource::from_data_uri("data:image/png;base64,bm90IGFuIGltYWdl");
        assert!(matches!(result, Err(PlannerError::ImageLoad(_))));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = MapSource::parse("/no/such/map.png");
        assert!(matches!(result, Err(PlannerError::ImageLoad(_))));
    }

    #[test]
    fn test_from_path_reads_png() {
        let path = std::env::temp_dir().join("portal_network_source_test.png");
        std::fs::write(&path, png_bytes(12, 4)).unwrap();

        let source = MapSource::from_path(&path).unwrap();
        assert_eq!(source.dimensions(), (12, 4));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_wide_map_is_downscaled() {
        let img = RgbImage::from_pixel(2000, 500, Rgb([10, 10, 10]));
        let source = MapSource::from_image(DynamicImage::ImageRgb8(img));

        let working = source.working_image(1000);
        assert_eq!(working.dimensions(), (1000, 250));
    }

    #[test]
    fn test_downscaled_height_truncates() {
        let img = RgbImage::from_pixel(1500, 1003, Rgb([10, 10, 10]));
        let source = MapSource::from_image(DynamicImage::ImageRgb8(img));

        assert_eq!(source.working_image(1000).dimensions(), (1000, 668));
    }

    #[test]
    fn test_narrow_map_is_kept() {
        let img = RgbImage::from_pixel(640, 480, Rgb([10, 10, 10]));
        let source = MapSource::from_image(DynamicImage::ImageRgb8(img));

        assert_eq!(source.working_image(1000).dimensions(), (640, 480));
    }
}
