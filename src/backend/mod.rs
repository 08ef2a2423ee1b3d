//! Rendering/encoding capability used by the pipeline and the exporters.
//!
//! The pipeline never talks to resvg or `image` directly; it goes through the
//! [`Backend`] trait so a different implementation (GPU rasterizer, another
//! codec library) can be dropped in without touching orchestration code.

mod resvg_backend;

pub use resvg_backend::ResvgBackend;

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;
use crate::raster::Raster;
use crate::transform::{ColorTransform, Placement};

// ============================================================================
// SourceRef
// ============================================================================

/// Where the source artwork comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceRef {
    /// An SVG or raster image file on disk.
    Path(PathBuf),

    /// SVG markup held in memory, such as a built-in template.
    Inline { name: String, markup: String },
}

impl SourceRef {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn inline(name: impl Into<String>, markup: impl Into<String>) -> Self {
        Self::Inline {
            name: name.into(),
            markup: markup.into(),
        }
    }

    /// Path used in error messages and logs.
    pub fn label(&self) -> &Path {
        match self {
            Self::Path(path) => path.as_path(),
            Self::Inline { name, .. } => Path::new(name),
        }
    }

    /// True if the source should be treated as SVG markup.
    pub fn looks_like_svg(&self) -> bool {
        match self {
            Self::Path(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("svg")),
            Self::Inline { .. } => true,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().display())
    }
}

impl From<PathBuf> for SourceRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SourceRef {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

// ============================================================================
// Source
// ============================================================================

/// Loaded source content.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContent {
    /// Color-transformed SVG markup. Every render re-parses it, so loaded
    /// sources stay plain data that can be shared between threads.
    Vector { markup: String },

    /// A decoded raster image.
    Raster(RgbaImage),
}

/// A source that has been read, color-transformed and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub origin: SourceRef,
    pub content: SourceContent,
    /// Intrinsic size in user units (vector) or pixels (raster).
    pub width: f32,
    pub height: f32,
}

impl Source {
    pub fn is_vector(&self) -> bool {
        matches!(self.content, SourceContent::Vector { .. })
    }

    /// The (transformed) SVG markup, if this is a vector source.
    pub fn markup(&self) -> Option<&str> {
        match &self.content {
            SourceContent::Vector { markup } => Some(markup),
            SourceContent::Raster(_) => None,
        }
    }
}

// ============================================================================
// Backend
// ============================================================================

/// Target encodings a backend must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RasterFormat {
    Png,
}

/// Interchangeable image-rendering/encoding implementation.
pub trait Backend: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Reads and validates a source, applying `colors` to vector markup.
    fn load(&self, source: &SourceRef, colors: &ColorTransform) -> Result<Source>;

    /// Draws `source` onto a fresh canvas of `placement.canvas` size.
    ///
    /// The canvas starts out filled with `background` (transparent when
    /// `None`); the source is composited over it.
    fn render(&self, source: &Source, placement: &Placement, background: Option<Color>) -> Result<Raster>;

    /// Encodes a raster into `format` bytes.
    fn encode(&self, raster: &Raster, format: RasterFormat) -> Result<Vec<u8>>;
}
