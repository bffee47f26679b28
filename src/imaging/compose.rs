//! Draw a [`LayoutPlan`] onto a background.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Normalize background (stretch) | `DynamicImage::resize_exact`, `Lanczos3` |
//! | Normalize background (fill) | `DynamicImage::resize_to_fill`, `Lanczos3` |
//! | Rasterize glyphs | `rusttype::PositionedGlyph::draw` coverage callback |
//! | Blend | source-over with glyph coverage as alpha |
//!
//! The background is never mutated; every call allocates one new canvas.

use super::font::{FontSpec, RenderError, ink_bounds};
use super::layout::{LayoutLine, LayoutPlan};
use super::params::CanvasSpec;
use crate::config::CanvasFit;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// Resize (and for `fill`, center-crop) the background to the canvas size.
pub fn normalize_background(background: &DynamicImage, canvas: &CanvasSpec) -> RgbaImage {
    if background.width() == canvas.width && background.height() == canvas.height {
        return background.to_rgba8();
    }
    let resized = match canvas.fit {
        CanvasFit::Stretch => {
            background.resize_exact(canvas.width, canvas.height, FilterType::Lanczos3)
        }
        CanvasFit::Fill => {
            background.resize_to_fill(canvas.width, canvas.height, FilterType::Lanczos3)
        }
    };
    resized.to_rgba8()
}

/// Composite every planned line onto a normalized copy of `background`.
pub fn compose(
    background: &DynamicImage,
    plan: &LayoutPlan,
    font: &FontSpec,
    color: Rgba<u8>,
    canvas: &CanvasSpec,
) -> Result<RgbaImage, RenderError> {
    if !font.size().is_finite() || font.size() <= 0.0 {
        return Err(RenderError::InvalidSize {
            path: font.path().to_path_buf(),
            size: font.size(),
        });
    }

    let mut image = normalize_background(background, canvas);
    for line in &plan.lines {
        let missing = font.missing_glyphs(&line.text);
        if !missing.is_empty() {
            tracing::warn!(font = %font.path().display(), ?missing, "font lacks glyphs");
        }
        draw_line(&mut image, font, line, color);
    }
    Ok(image)
}

/// Draw one line so its ink box's top-left corner lands on `(line.x, line.y)`.
///
/// Pixels falling outside the canvas are skipped, so overflowing lines are
/// cut by the image edge rather than by the layout.
fn draw_line(image: &mut RgbaImage, font: &FontSpec, line: &LayoutLine, color: Rgba<u8>) {
    let glyphs = font.positioned_glyphs(&line.text);
    let Some(bounds) = ink_bounds(&glyphs) else {
        return;
    };
    let dx = line.x - bounds.min.x;
    let dy = line.y - bounds.min.y;
    let (width, height) = (image.width() as i32, image.height() as i32);

    for glyph in &glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = bb.min.x + gx as i32 + dx;
            let py = bb.min.y + gy as i32 + dy;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            blend(image.get_pixel_mut(px as u32, py as u32), color, coverage);
        });
    }
}

/// Source-over blend of `color` at `coverage` (0.0–1.0) onto `dst`.
fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0) * f32::from(color.0[3]) / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let inv = 1.0 - alpha;
    for c in 0..3 {
        dst.0[c] = (f32::from(color.0[c]) * alpha + f32::from(dst.0[c]) * inv).round() as u8;
    }
    dst.0[3] = 255;
}
