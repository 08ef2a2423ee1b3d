//! Output descriptions: what file to produce, in which format and at which size.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::SizePx;
use crate::transform::FitMode;

/// Frame sizes packed into an ICO when the output does not list its own.
pub const DEFAULT_ICO_SIZES: [u32; 3] = [16, 32, 48];

/// Largest frame an ICO directory entry can describe.
pub const MAX_ICO_SIZE: u32 = 256;

// ============================================================================
// OutputFormat
// ============================================================================

/// Target encoding of an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum OutputFormat {
    Png,
    Ico,
    Svg,
    Manifest,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Ico => "ico",
            Self::Svg => "svg",
            Self::Manifest => "manifest",
        }
    }

    /// True for formats produced by rasterizing the source.
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png | Self::Ico)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AssetRole
// ============================================================================

/// Logical role of a generated file, recorded in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum AssetRole {
    Favicon,
    AppleTouchIcon,
    AndroidChrome,
    OgImage,
    Manifest,
    Icon,
}

impl AssetRole {
    /// Guesses the role from the conventional file names.
    pub fn infer(name: &str, format: OutputFormat) -> Self {
        if format == OutputFormat::Manifest {
            return Self::Manifest;
        }

        let name = name.to_ascii_lowercase();
        if name.starts_with("favicon") {
            Self::Favicon
        } else if name.starts_with("apple-touch-icon") {
            Self::AppleTouchIcon
        } else if name.starts_with("android-chrome") {
            Self::AndroidChrome
        } else if name.starts_with("og-image") || name.starts_with("og_image") {
            Self::OgImage
        } else if name.ends_with(".webmanifest") || name == "manifest.json" {
            Self::Manifest
        } else {
            Self::Icon
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favicon => "favicon",
            Self::AppleTouchIcon => "apple-touch-icon",
            Self::AndroidChrome => "android-chrome",
            Self::OgImage => "og-image",
            Self::Manifest => "manifest",
            Self::Icon => "icon",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// OutputSpec
// ============================================================================

/// One file to produce.
///
/// ```yaml
/// - name: apple-touch-icon.png
///   format: png
///   width: 180
/// - name: og-image.png
///   format: png
///   width: 1200
///   height: 630
///   fit: contain
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct OutputSpec {
    /// File name relative to the output directory.
    pub name: String,

    pub format: OutputFormat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Defaults to `width`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Overrides the pipeline-wide fit mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitMode>,

    /// ICO frame sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<u32>>,

    /// Inferred from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AssetRole>,
}

impl OutputSpec {
    fn new(name: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            name: name.into(),
            format,
            width: None,
            height: None,
            fit: None,
            sizes: None,
            role: None,
        }
    }

    pub fn png(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::new(name, OutputFormat::Png)
        }
    }

    /// An ICO whose largest frame is `width`.
    pub fn ico(name: impl Into<String>, width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::new(name, OutputFormat::Ico)
        }
    }

    pub fn svg(name: impl Into<String>) -> Self {
        Self::new(name, OutputFormat::Svg)
    }

    pub fn manifest(name: impl Into<String>) -> Self {
        Self::new(name, OutputFormat::Manifest)
    }

    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = Some(fit);
        self
    }

    pub fn with_sizes(mut self, sizes: impl Into<Vec<u32>>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn with_role(mut self, role: AssetRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Target canvas size for raster formats.
    pub fn size(&self) -> Option<SizePx> {
        match self.format {
            OutputFormat::Png | OutputFormat::Ico => {
                let width = self.width?;
                Some(SizePx::new(width, self.height.unwrap_or(width)))
            }
            OutputFormat::Svg | OutputFormat::Manifest => None,
        }
    }

    pub fn role(&self) -> AssetRole {
        self.role.unwrap_or_else(|| AssetRole::infer(&self.name, self.format))
    }

    /// Square frame sizes of an ICO output, ascending and deduplicated.
    ///
    /// Without explicit `sizes`, the default frames up to `width` are used,
    /// plus `width` itself.
    pub fn ico_sizes(&self) -> Vec<u32> {
        let mut sizes = match (&self.sizes, self.width) {
            (Some(sizes), _) => sizes.clone(),
            (None, Some(width)) => {
                let mut sizes: Vec<u32> = DEFAULT_ICO_SIZES.into_iter().filter(|s| *s <= width).collect();
                sizes.push(width);
                sizes
            }
            (None, None) => DEFAULT_ICO_SIZES.to_vec(),
        };
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }

    /// Checks the invariants of a single output.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;

        if self.sizes.is_some() && self.format != OutputFormat::Ico {
            return Err(Error::config(format!(
                "output {:?}: sizes only apply to ico outputs",
                self.name
            )));
        }

        if !self.format.is_raster() {
            return Ok(());
        }

        match self.width {
            None => {
                return Err(Error::config(format!(
                    "output {:?}: {} outputs require a width",
                    self.name, self.format
                )));
            }
            Some(0) => {
                return Err(Error::config(format!("output {:?}: width must be at least 1", self.name)));
            }
            Some(_) => {}
        }
        if self.height == Some(0) {
            return Err(Error::config(format!("output {:?}: height must be at least 1", self.name)));
        }

        if self.format == OutputFormat::Ico {
            let sizes = self.ico_sizes();
            if sizes.is_empty() {
                return Err(Error::config(format!("output {:?}: ico needs at least one frame", self.name)));
            }
            if let Some(bad) = sizes.iter().find(|s| **s == 0 || **s > MAX_ICO_SIZE) {
                return Err(Error::config(format!(
                    "output {:?}: ico frame size {bad} is outside 1..={MAX_ICO_SIZE}",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::config("output name is empty"));
    }
    // Exactly one normal component: no directories, no `.`/`..`, no root.
    // Backslashes are rejected on every platform so presets stay portable.
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    );
    if !plain || name.contains('\\') {
        return Err(Error::config(format!(
            "output name {name:?} must be a plain file name"
        )));
    }
    Ok(())
}
