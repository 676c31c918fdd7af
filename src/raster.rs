use image::{DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

use crate::color::Color;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("raster has no pixels ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

/// An immutable RGBA8 pixel grid.
///
/// Always at least 1x1. Once built, a raster is never written to; edits
/// produce a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raster {
    img: RgbaImage,
}

impl Raster {
    /// Build from a row-major RGBA byte buffer.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyRaster { width, height });
        }
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        let img = RgbaImage::from_raw(width, height, data)
            .filter(|_| actual == expected)
            .ok_or(RasterError::BufferSizeMismatch { expected, actual })?;
        Ok(Self { img })
    }

    pub fn from_image(img: RgbaImage) -> Result<Self, RasterError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyRaster { width, height });
        }
        Ok(Self { img })
    }

    /// Single-colour raster, mostly useful for tests and placeholders.
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Result<Self, RasterError> {
        Self::from_image(RgbaImage::from_pixel(width, height, Rgba(pixel)))
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.img.dimensions()
    }

    pub fn pixel_count(&self) -> usize {
        self.img.width() as usize * self.img.height() as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.img.get_pixel(x, y).0)
    }

    /// Eyedropper: RGB of the pixel at `(x, y)`, alpha dropped.
    pub fn color_at(&self, x: u32, y: u32) -> Option<Color> {
        self.pixel(x, y).map(|[r, g, b, _]| Color::new(r, g, b))
    }

    /// Row-major RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.img.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.img
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }
}

impl TryFrom<RgbaImage> for Raster {
    type Error = RasterError;

    fn try_from(img: RgbaImage) -> Result<Self, Self::Error> {
        Self::from_image(img)
    }
}

impl TryFrom<DynamicImage> for Raster {
    type Error = RasterError;

    fn try_from(img: DynamicImage) -> Result<Self, Self::Error> {
        Self::from_image(img.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_dimensions() {
        assert_eq!(
            Raster::from_rgba(0, 4, vec![]),
            Err(RasterError::EmptyRaster { width: 0, height: 4 })
        );
        assert!(matches!(
            Raster::from_image(RgbaImage::new(3, 0)),
            Err(RasterError::EmptyRaster { .. })
        ));
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        assert_eq!(
            Raster::from_rgba(2, 2, vec![0; 15]),
            Err(RasterError::BufferSizeMismatch { expected: 16, actual: 15 })
        );
        // oversized buffers are not silently truncated
        assert_eq!(
            Raster::from_rgba(1, 1, vec![0; 8]),
            Err(RasterError::BufferSizeMismatch { expected: 4, actual: 8 })
        );
    }

    #[test]
    fn eyedropper_reads_rgb() {
        let raster = Raster::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 128, 255, 10]).unwrap();
        assert_eq!(raster.color_at(1, 0), Some(Color::new(0, 128, 255)));
        assert_eq!(raster.pixel(1, 0), Some([0, 128, 255, 10]));
        assert_eq!(raster.color_at(2, 0), None);
        assert_eq!(raster.color_at(0, 1), None);
    }

    #[test]
    fn converts_dynamic_images_to_rgba() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        let raster = Raster::try_from(DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.pixel(2, 1), Some([1, 2, 3, 255]));
        assert_eq!(raster.pixel_count(), 6);
    }
}
