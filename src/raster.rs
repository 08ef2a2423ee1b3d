//! Pixel geometry and the raster type passed between backend and exporters.

use std::fmt;

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// A rectangle defined in pixel coordinates.
///
/// Used for the content bounds of a rendered raster: the smallest rectangle
/// holding every pixel that is not fully transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle starting at origin (0, 0) with the given dimensions.
    pub fn from_size(size: SizePx) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Returns true if width equals height.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for SizePx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rendered bitmap.
///
/// The default backend always produces 8-bit RGBA, but a substituted backend
/// may hand back any [`DynamicImage`] mode; exporters check the mode they
/// receive and reject what their format cannot carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub data: DynamicImage,
}

impl Raster {
    pub fn new(data: DynamicImage) -> Self {
        Self { data }
    }

    pub fn from_rgba(data: RgbaImage) -> Self {
        Self::new(DynamicImage::ImageRgba8(data))
    }

    /// Returns the pixel dimensions of the raster.
    pub fn size(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    /// Bounding box of all pixels with non-zero alpha, or `None` when the
    /// raster is fully transparent.
    pub fn content_bounds(&self) -> Option<RectPx> {
        let rgba = self.data.to_rgba8();
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut found = false;

        for (x, y, pixel) in rgba.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        found.then(|| RectPx::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Number of pixels whose alpha is below 255.
    pub fn translucent_pixel_count(&self) -> usize {
        self.data
            .to_rgba8()
            .pixels()
            .filter(|p| p[3] < u8::MAX)
            .count()
    }
}
