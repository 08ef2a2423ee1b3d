//! Default backend: resvg for vector sources, `image` for raster sources and
//! for PNG encoding.

use std::fs;

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgba, RgbaImage};
use resvg::tiny_skia::{self, Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::debug;

use super::{Backend, RasterFormat, Source, SourceContent, SourceRef};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::raster::{Raster, RectPx, SizePx};
use crate::transform::{ColorTransform, Placement};

/// Renders SVG with resvg and raster sources with Lanczos resampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgBackend;

impl ResvgBackend {
    pub fn new() -> Self {
        Self
    }

    fn load_vector(&self, origin: &SourceRef, markup: &str, colors: &ColorTransform) -> Result<Source> {
        let markup = colors.apply(markup);
        let tree = parse_tree(&markup).map_err(|e| match e {
            // Zero or negative width/height/viewBox.
            resvg::usvg::Error::InvalidSize => {
                Error::config(format!("source {origin} has zero width or height"))
            }
            other => Error::source_load(origin.label(), other),
        })?;
        let size = tree.size();
        ensure_not_empty(origin, size.width(), size.height())?;

        Ok(Source {
            origin: origin.clone(),
            content: SourceContent::Vector { markup },
            width: size.width(),
            height: size.height(),
        })
    }

    fn load_raster(&self, origin: &SourceRef, bytes: &[u8], colors: &ColorTransform) -> Result<Source> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::source_load(origin.label(), e))?
            .to_rgba8();
        ensure_not_empty(origin, image.width() as f32, image.height() as f32)?;

        if !colors.is_identity() {
            debug!(source = %origin, "color substitution does not apply to raster sources");
        }

        Ok(Source {
            origin: origin.clone(),
            width: image.width() as f32,
            height: image.height() as f32,
            content: SourceContent::Raster(image),
        })
    }
}

impl Backend for ResvgBackend {
    fn name(&self) -> &'static str {
        "resvg"
    }

    fn load(&self, source: &SourceRef, colors: &ColorTransform) -> Result<Source> {
        match source {
            SourceRef::Inline { markup, .. } => self.load_vector(source, markup, colors),
            SourceRef::Path(path) => {
                let bytes = fs::read(path).map_err(|e| Error::source_load(path, e))?;
                if source.looks_like_svg() || sniff_svg(&bytes) {
                    let markup = String::from_utf8(bytes)
                        .map_err(|_| Error::source_load(path, "SVG is not valid UTF-8"))?;
                    self.load_vector(source, &markup, colors)
                } else {
                    self.load_raster(source, &bytes, colors)
                }
            }
        }
    }

    fn render(&self, source: &Source, placement: &Placement, background: Option<Color>) -> Result<Raster> {
        match &source.content {
            SourceContent::Vector { markup } => render_vector(markup, placement, background),
            SourceContent::Raster(image) => Ok(render_raster(image, placement, background)),
        }
    }

    fn encode(&self, raster: &Raster, format: RasterFormat) -> Result<Vec<u8>> {
        match format {
            RasterFormat::Png => encode_png(raster),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

fn parse_tree(markup: &str) -> std::result::Result<Tree, resvg::usvg::Error> {
    let opts = Options::default();
    Tree::from_str(markup, &opts)
}

fn ensure_not_empty(origin: &SourceRef, width: f32, height: f32) -> Result<()> {
    if width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(Error::config(format!(
            "source {origin} has zero width or height ({width}x{height})"
        )))
    }
}

/// Detects SVG files that lack an `.svg` extension.
fn sniff_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

// ============================================================================
// Rendering
// ============================================================================

fn render_vector(markup: &str, placement: &Placement, background: Option<Color>) -> Result<Raster> {
    let tree = parse_tree(markup).map_err(|e| Error::Render(format!("failed to parse SVG: {e}")))?;

    let canvas = placement.canvas;
    let mut pixmap = Pixmap::new(canvas.width, canvas.height)
        .ok_or_else(|| Error::Render(format!("cannot allocate a {canvas} canvas")))?;

    if let Some(color) = background {
        pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    let transform = Transform::from_row(
        placement.scale_x,
        0.0,
        0.0,
        placement.scale_y,
        placement.offset_x,
        placement.offset_y,
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(Raster::from_rgba(pixmap_to_rgba_image(&pixmap)))
}

fn render_raster(image: &RgbaImage, placement: &Placement, background: Option<Color>) -> Raster {
    let canvas = placement.canvas;
    let fill = background.unwrap_or(Color::TRANSPARENT);
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba(fill.to_array()));

    // Only the part of the source that lands on the canvas is resampled, so
    // the buffer stays near canvas size however far cover overflows.
    let full = RectPx::from_size(SizePx::new(image.width(), image.height()));
    let visible = if placement.crops() {
        visible_source_rect(full, placement)
    } else {
        full
    };
    let region = imageops::crop_imm(image, visible.x, visible.y, visible.width, visible.height).to_image();

    let (x0, x1) = canvas_span(visible.x, visible.right(), placement.offset_x, placement.scale_x);
    let (y0, y1) = canvas_span(visible.y, visible.bottom(), placement.offset_y, placement.scale_y);
    let width = (x1 - x0).max(1) as u32;
    let height = (y1 - y0).max(1) as u32;
    let scaled = imageops::resize(&region, width, height, FilterType::Lanczos3);

    composite_over(&mut out, &scaled, x0, y0);

    Raster::from_rgba(out)
}

/// Source pixels that land on the canvas, widened to whole pixels.
fn visible_source_rect(full: RectPx, placement: &Placement) -> RectPx {
    let axis = |offset: f32, scale: f32, extent: u32, len: u32| -> (u32, u32) {
        let offset = f64::from(offset);
        let scale = f64::from(scale);
        let last = f64::from(len.saturating_sub(1));
        let start = (-offset / scale).floor().clamp(0.0, last) as u32;
        let end = ((f64::from(extent) - offset) / scale).ceil().min(f64::from(len)) as u32;
        (start, end.max(start + 1) - start)
    };

    let (x, width) = axis(placement.offset_x, placement.scale_x, placement.canvas.width, full.width);
    let (y, height) = axis(placement.offset_y, placement.scale_y, placement.canvas.height, full.height);
    RectPx::new(x, y, width, height)
}

/// Canvas coordinates of the source span `start..end`, rounded to pixels.
fn canvas_span(start: u32, end: u32, offset: f32, scale: f32) -> (i64, i64) {
    let map = |v: u32| (f64::from(offset) + f64::from(v) * f64::from(scale)).round() as i64;
    (map(start), map(end))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        // tiny_skia uses premultiplied alpha, we need to unpremultiply
        let (r, g, b, a) = unpremultiply(src.red(), src.green(), src.blue(), src.alpha());
        *dst = Rgba([r, g, b, a]);
    }

    img
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination). Pixels that fall
/// outside the destination are dropped, which is how cover crops.
fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let dest_width = i64::from(dest.width());
    let dest_height = i64::from(dest.height());

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + i64::from(sx);
        let dy = y + i64::from(sy);

        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }

        let dst_pixel = dest.get_pixel(dx as u32, dy as u32);
        let blended = alpha_blend(*src_pixel, *dst_pixel);
        dest.put_pixel(dx as u32, dy as u32, blended);
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Encoding
// ============================================================================

fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    let data = &raster.data;
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilter::Adaptive);
    encoder
        .write_image(data.as_bytes(), data.width(), data.height(), data.color().into())
        .map_err(|e| Error::Export(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================
