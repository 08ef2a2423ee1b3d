//! Per-output transforms: color substitution and fit-mode resizing.

pub mod color;
pub mod resize;

pub use color::{ColorReplacement, ColorTransform};
pub use resize::{FitMode, Placement, ResizeTransform};
