use image::ExtendedColorType;
use image::codecs::ico::{IcoEncoder, IcoFrame};

use super::RasterExporter;
use crate::backend::{Backend, RasterFormat};
use crate::error::{Error, Result};
use crate::output::MAX_ICO_SIZE;
use crate::raster::Raster;

/// Packs square RGBA frames into a multi-resolution ICO container.
///
/// Every frame is stored PNG-compressed, which all current browsers and
/// Windows Vista onwards accept.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcoExporter;

impl IcoExporter {
    fn check_frame(raster: &Raster) -> Result<()> {
        let size = raster.size();
        if raster.data.as_rgba8().is_none() {
            return Err(Error::Export(format!(
                "ico frames must be 8-bit RGBA, got {:?}",
                raster.data.color()
            )));
        }
        if !size.is_square() {
            return Err(Error::Export(format!("ico frame {size} is not square")));
        }
        if size.is_empty() || size.width > MAX_ICO_SIZE {
            return Err(Error::Export(format!(
                "ico frame {size} is outside 1..={MAX_ICO_SIZE}"
            )));
        }
        Ok(())
    }
}

impl RasterExporter for IcoExporter {
    fn export(&self, frames: &[Raster], backend: &dyn Backend) -> Result<Vec<u8>> {
        if frames.is_empty() {
            return Err(Error::Export("ico needs at least one frame".into()));
        }

        let mut entries = Vec::with_capacity(frames.len());
        for raster in frames {
            Self::check_frame(raster)?;
            let png = backend.encode(raster, RasterFormat::Png)?;
            let size = raster.size();
            let frame = IcoFrame::with_encoded(png, size.width, size.height, ExtendedColorType::Rgba8)
                .map_err(|e| Error::Export(format!("ico frame {size}: {e}")))?;
            entries.push(frame);
        }

        let mut bytes = Vec::new();
        IcoEncoder::new(&mut bytes)
            .encode_images(&entries)
            .map_err(|e| Error::Export(format!("ico encoding failed: {e}")))?;
        Ok(bytes)
    }
}
