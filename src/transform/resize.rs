//! Fit-mode geometry.
//!
//! Reconciling a source aspect ratio with a target rectangle is pure
//! arithmetic; the backend only has to draw the source with the resulting
//! [`Placement`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::SizePx;

/// Policy for reconciling the source aspect ratio with the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum FitMode {
    /// Scale until the target is filled, then center-crop the overflow.
    #[default]
    Cover,
    /// Scale until the source fits, then pad to the target size.
    Contain,
    /// Scale each axis independently. Distorts; kept for old configurations.
    Stretch,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Stretch => "stretch",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Ok(Self::Cover),
            "contain" => Ok(Self::Contain),
            "stretch" => Ok(Self::Stretch),
            other => Err(Error::config(format!(
                "unknown fit mode {other:?} (expected cover, contain or stretch)"
            ))),
        }
    }
}

/// Where and how large the source is drawn on the target canvas.
///
/// Source point `(x, y)` lands at
/// `(offset_x + x * scale_x, offset_y + y * scale_y)`. Offsets are negative
/// when the source overflows the canvas (cover) and positive when it is
/// padded (contain).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub canvas: SizePx,
    pub source_width: f32,
    pub source_height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Placement {
    /// Computes the placement of a `source_width x source_height` source on
    /// a `target` canvas.
    ///
    /// A source or target with a zero (or non-finite) dimension is a
    /// configuration error.
    pub fn compute(source_width: f32, source_height: f32, target: SizePx, fit: FitMode) -> Result<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(source_width) || !valid(source_height) {
            return Err(Error::config(format!(
                "source has zero width or height ({source_width}x{source_height})"
            )));
        }
        if target.is_empty() {
            return Err(Error::config(format!("target size {target} is empty")));
        }

        let tw = f64::from(target.width);
        let th = f64::from(target.height);
        let sw = f64::from(source_width);
        let sh = f64::from(source_height);

        let (scale_x, scale_y) = match fit {
            FitMode::Stretch => (tw / sw, th / sh),
            FitMode::Contain => {
                let s = (tw / sw).min(th / sh);
                (s, s)
            }
            FitMode::Cover => {
                // Overscan by a hair so float rounding never leaves a
                // partially covered edge row.
                let s = (tw / sw).max(th / sh) * (1.0 + 1e-6);
                (s, s)
            }
        };

        Ok(Self {
            canvas: target,
            source_width,
            source_height,
            scale_x: scale_x as f32,
            scale_y: scale_y as f32,
            offset_x: ((tw - sw * scale_x) / 2.0) as f32,
            offset_y: ((th - sh * scale_y) / 2.0) as f32,
        })
    }

    /// Size of the scaled source, in (fractional) pixels.
    pub fn scaled_size(&self) -> (f32, f32) {
        (
            self.source_width * self.scale_x,
            self.source_height * self.scale_y,
        )
    }

    /// Scaled source size rounded to whole pixels, never below one pixel.
    pub fn scaled_size_px(&self) -> SizePx {
        let (w, h) = self.scaled_size();
        SizePx::new((w.round() as u32).max(1), (h.round() as u32).max(1))
    }

    /// True if part of the source falls outside the canvas.
    pub fn crops(&self) -> bool {
        self.offset_x < -0.5 || self.offset_y < -0.5
    }
}

/// Resize step of an output: target size plus fit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTransform {
    pub target: SizePx,
    pub fit: FitMode,
}

impl ResizeTransform {
    pub fn new(target: SizePx, fit: FitMode) -> Self {
        Self { target, fit }
    }

    /// Placement of a source of the given size.
    pub fn placement(&self, source_width: f32, source_height: f32) -> Result<Placement> {
        Placement::compute(source_width, source_height, self.target, self.fit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(sw: f32, sh: f32, w: u32, h: u32, fit: FitMode) -> Placement {
        Placement::compute(sw, sh, SizePx::new(w, h), fit).unwrap()
    }

    #[test]
    fn cover_crops_wide_source() {
        let p = place(800.0, 400.0, 64, 64, FitMode::Cover);
        let (w, h) = p.scaled_size();
        assert!(w >= 128.0 && h >= 64.0);
        assert!(p.crops());
        assert_eq!(p.scale_x, p.scale_y);
        assert!(p.offset_y <= 0.0);
        assert!((p.offset_x + 32.0).abs() < 0.01);
    }

    #[test]
    fn contain_pads_wide_source() {
        let p = place(800.0, 400.0, 64, 64, FitMode::Contain);
        assert_eq!(p.scaled_size_px(), SizePx::new(64, 32));
        assert!(!p.crops());
        assert_eq!(p.offset_y, 16.0);
        assert_eq!(p.offset_x, 0.0);
    }

    #[test]
    fn stretch_fills_exactly() {
        let p = place(800.0, 400.0, 64, 64, FitMode::Stretch);
        assert_eq!(p.scaled_size_px(), SizePx::new(64, 64));
        assert_ne!(p.scale_x, p.scale_y);
        assert!(!p.crops());
        assert_eq!((p.offset_x, p.offset_y), (0.0, 0.0));
    }

    #[test]
    fn same_aspect_is_neutral_in_every_mode() {
        for fit in [FitMode::Cover, FitMode::Contain, FitMode::Stretch] {
            let p = place(512.0, 512.0, 32, 32, fit);
            assert_eq!(p.scaled_size_px(), SizePx::square(32), "{fit}");
            assert!(!p.crops(), "{fit}");
            assert_eq!(p.scale_x, p.scale_y, "{fit}");
        }
    }

    #[test]
    fn zero_sized_source_is_a_configuration_error() {
        let err = Placement::compute(0.0, 100.0, SizePx::square(16), FitMode::Cover).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(Placement::compute(10.0, 10.0, SizePx::new(16, 0), FitMode::Cover).is_err());
    }

    #[test]
    fn fit_mode_parses_case_insensitively() {
        assert_eq!("Contain".parse::<FitMode>().unwrap(), FitMode::Contain);
        assert!("squash".parse::<FitMode>().is_err());
        assert_eq!(FitMode::default(), FitMode::Cover);
    }
}
