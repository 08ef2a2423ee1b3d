//! Format-specific encoders.
//!
//! Raster exporters turn rendered frames into file bytes through the
//! [`Backend`] so encoding stays swappable with rendering. The SVG and
//! manifest exporters work from markup and metadata instead.

mod ico;
mod manifest;
mod png;
mod svg;

pub use ico::IcoExporter;
pub use manifest::{ManifestAsset, ManifestExporter, ManifestIcon, WebManifest};
pub use png::PngExporter;
pub use svg::SvgExporter;

use std::path::PathBuf;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::output::{AssetRole, OutputFormat};
use crate::raster::{Raster, SizePx};

/// Encodes rendered frames into the bytes of one output file.
pub trait RasterExporter {
    fn export(&self, frames: &[Raster], backend: &dyn Backend) -> Result<Vec<u8>>;
}

/// A file written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    pub name: String,
    pub path: PathBuf,
    pub format: OutputFormat,
    pub role: AssetRole,
    /// Pixel sizes contained in the file; empty for SVG.
    pub sizes: Vec<SizePx>,
    /// Size of the written file.
    pub bytes: u64,
}

impl GeneratedAsset {
    /// The largest contained size, if any.
    pub fn primary_size(&self) -> Option<SizePx> {
        self.sizes
            .iter()
            .copied()
            .max_by_key(|s| u64::from(s.width) * u64::from(s.height))
    }
}

/// Rejects 32-bit float rasters, which no exported format can carry.
pub(crate) fn ensure_integer_depth(raster: &Raster, format: OutputFormat) -> Result<()> {
    match raster.data {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => Err(Error::Export(format!(
            "{format} cannot store 32-bit float rasters ({:?})",
            raster.data.color()
        ))),
        _ => Ok(()),
    }
}
