use super::{RasterExporter, ensure_integer_depth};
use crate::backend::{Backend, RasterFormat};
use crate::error::{Error, Result};
use crate::output::OutputFormat;
use crate::raster::Raster;

/// Writes a single raster as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngExporter;

impl RasterExporter for PngExporter {
    fn export(&self, frames: &[Raster], backend: &dyn Backend) -> Result<Vec<u8>> {
        let [raster] = frames else {
            return Err(Error::Export(format!(
                "png takes exactly one frame, got {}",
                frames.len()
            )));
        };
        ensure_integer_depth(raster, OutputFormat::Png)?;
        backend.encode(raster, RasterFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgba, RgbaImage, Rgba32FImage};

    use super::*;
    use crate::backend::ResvgBackend;

    #[test]
    fn encodes_one_frame() {
        let raster = Raster::from_rgba(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])));
        let bytes = PngExporter.export(&[raster], &ResvgBackend::new()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn rejects_float_rasters() {
        let raster = Raster::new(DynamicImage::ImageRgba32F(Rgba32FImage::new(2, 2)));
        let err = PngExporter.export(&[raster], &ResvgBackend::new()).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }

    #[test]
    fn rejects_frame_count_mismatch() {
        let err = PngExporter.export(&[], &ResvgBackend::new()).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }
}
