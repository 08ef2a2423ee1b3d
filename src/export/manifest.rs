//! PWA web manifest.
//!
//! Besides the standard members, the manifest carries an `assets` list that
//! records every generated file in output order:
//!
//! ```json
//! {
//!   "name": "logo",
//!   "short_name": "logo",
//!   "icons": [
//!     { "src": "/android-chrome-192x192.png", "sizes": "192x192", "type": "image/png", "purpose": "any maskable" }
//!   ],
//!   "theme_color": "#ffffff",
//!   "background_color": "#ffffff",
//!   "display": "standalone",
//!   "assets": [
//!     { "src": "/favicon.ico", "format": "ico", "role": "favicon", "sizes": ["16x16", "32x32", "48x48"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::GeneratedAsset;
use crate::color::{Color, ColorTheme};
use crate::config::ManifestOptions;
use crate::error::{Error, Result};
use crate::output::{AssetRole, OutputFormat};
use crate::raster::SizePx;

/// Icons at least this wide are declared maskable.
const MASKABLE_MIN_WIDTH: u32 = 192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub src: String,
    pub format: OutputFormat,
    pub role: AssetRole,
    pub sizes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub icons: Vec<ManifestIcon>,
    pub theme_color: String,
    pub background_color: String,
    pub display: String,
    pub assets: Vec<ManifestAsset>,
}

/// Builds the manifest from the assets of a run.
#[derive(Debug, Clone)]
pub struct ManifestExporter {
    name: String,
    short_name: String,
    display: String,
    theme: ColorTheme,
}

impl ManifestExporter {
    /// `default_name` is used when the options do not name the app.
    pub fn new(options: &ManifestOptions, theme: ColorTheme, default_name: &str) -> Self {
        let name = options.name.clone().unwrap_or_else(|| default_name.to_string());
        let short_name = options.short_name.clone().unwrap_or_else(|| name.clone());
        Self {
            name,
            short_name,
            display: options.display.clone(),
            theme,
        }
    }

    pub fn build(&self, assets: &[GeneratedAsset]) -> WebManifest {
        let icons = assets
            .iter()
            .filter(|asset| asset.format == OutputFormat::Png && asset.role != AssetRole::OgImage)
            .filter_map(|asset| {
                // Icons (maskable ones in particular) are square; social
                // previews and other banners are only listed under `assets`.
                let size = asset.primary_size().filter(SizePx::is_square)?;
                Some(ManifestIcon {
                    src: format!("/{}", asset.name),
                    sizes: size.to_string(),
                    mime_type: "image/png".into(),
                    purpose: (size.width >= MASKABLE_MIN_WIDTH).then(|| "any maskable".into()),
                })
            })
            .collect();

        let assets = assets
            .iter()
            .map(|asset| ManifestAsset {
                src: format!("/{}", asset.name),
                format: asset.format,
                role: asset.role,
                sizes: asset.sizes.iter().map(ToString::to_string).collect(),
            })
            .collect();

        WebManifest {
            name: self.name.clone(),
            short_name: self.short_name.clone(),
            icons,
            theme_color: self.theme.foreground.unwrap_or(Color::WHITE).to_hex(),
            background_color: self.theme.background.unwrap_or(Color::WHITE).to_hex(),
            display: self.display.clone(),
            assets,
        }
    }

    /// Pretty-printed manifest JSON with a trailing newline.
    pub fn export(&self, assets: &[GeneratedAsset]) -> Result<Vec<u8>> {
        let mut json = serde_json::to_vec_pretty(&self.build(assets))
            .map_err(|e| Error::Export(format!("manifest serialization failed: {e}")))?;
        json.push(b'\n');
        Ok(json)
    }
}
