//! Composited frames and their transmissible encodings.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::CompositorResult;

/// One frame of the fallback crossfade.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFrame {
    /// Position in the sequence, starting at 0
    pub index: u32,
    /// Number of intervals in the sequence (frames = total_steps + 1)
    pub total_steps: u32,
    /// Blended pixels
    pub image: RgbaImage,
}

impl CompositeFrame {
    pub fn new(index: u32, total_steps: u32, image: RgbaImage) -> Self {
        Self {
            index,
            total_steps,
            image,
        }
    }

    /// Opacity of the "after" image in this frame.
    pub fn opacity(&self) -> f64 {
        self.index as f64 / self.total_steps as f64
    }

    /// Encode the frame as PNG.
    pub fn encode_png(&self) -> CompositorResult<Vec<u8>> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// Encode the frame as a `data:image/png;base64,...` URI.
    pub fn to_data_uri(&self) -> CompositorResult<String> {
        let png = self.encode_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

/// Load an image file as RGBA8.
pub fn load_image(path: impl AsRef<Path>) -> CompositorResult<RgbaImage> {
    Ok(image::open(path.as_ref())?.to_rgba8())
}

/// Decode an in-memory image as RGBA8.
pub fn load_image_from_memory(bytes: &[u8]) -> CompositorResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::error::CompositorError;

    fn frame() -> CompositeFrame {
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        CompositeFrame::new(4, 10, image)
    }

    #[test]
    fn test_opacity() {
        assert_eq!(frame().opacity(), 0.4);
    }

    #[test]
    fn test_png_decodes_to_same_pixels() {
        let frame = frame();
        let png = frame.encode_png().unwrap();
        let decoded = load_image_from_memory(&png).unwrap();
        assert_eq!(decoded, frame.image);
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = frame().to_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        let payload = uri.trim_start_matches("data:image/png;base64,");
        let png = STANDARD.decode(payload).unwrap();
        assert_eq!(load_image_from_memory(&png).unwrap().dimensions(), (3, 2));
    }

    #[test]
    fn test_load_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("before.png");
        frame().image.save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
    }

    #[test]
    fn test_load_missing_image_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, CompositorError::Image(_)));
    }
}
