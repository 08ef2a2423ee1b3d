//! Color values and the theme applied to every output.

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Color
// ============================================================================

/// An 8-bit sRGB color with alpha.
///
/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` (leading `#` optional) and CSS color
/// names such as `rebeccapurple`. Serializes back to its hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses a color, returning a configuration error on bad input.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let rgb: Srgb<u8> = hex[..6]
                .parse()
                .map_err(|_| Error::config(format!("invalid color {value:?}")))?;
            let alpha = u8::from_str_radix(&hex[6..], 16)
                .map_err(|_| Error::config(format!("invalid alpha in color {value:?}")))?;
            return Ok(Self::from_srgb(rgb, alpha));
        }

        if let Ok(rgb) = hex.parse::<Srgb<u8>>() {
            return Ok(Self::from_srgb(rgb, 255));
        }

        palette::named::from_str(&trimmed.to_ascii_lowercase())
            .map(|rgb| Self::from_srgb(rgb, 255))
            .ok_or_else(|| Error::config(format!("invalid color {value:?}")))
    }

    fn from_srgb(rgb: Srgb<u8>, alpha: u8) -> Self {
        let (r, g, b) = rgb.into_components();
        Self::rgba(r, g, b, alpha)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// ============================================================================
// ColorTheme
// ============================================================================

/// Optional background and foreground applied to every output.
///
/// The foreground recolors the painted parts of a vector source before
/// rasterization; the background fills the canvas underneath the artwork and
/// the padding added by `contain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ColorTheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "jsonschema", schemars(with = "Option<String>"))]
    pub background: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "jsonschema", schemars(with = "Option<String>"))]
    pub foreground: Option<Color>,
}

impl ColorTheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.background.is_none() && self.foreground.is_none()
    }
}
