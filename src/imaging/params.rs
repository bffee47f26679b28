//! Parameter types for layout and composition.
//!
//! These structs describe *what* to draw, not *how*. They are the interface
//! between the [`pipeline`](crate::pipeline) (which turns config into policy)
//! and the [`layout`](super::layout) / [`compose`](super::compose) modules
//! (which do the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1 to 100, default 90). Clamped on construction.
//! - [`LayoutParams`]: Wrap width, canvas width, first-line offset and line spacing.
//! - [`CanvasSpec`]: Output canvas dimensions and background fit policy.

use crate::config::{CanvasFit, PipelineConfig};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Policy inputs to the word-wrap layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    /// Lines wrap once their measured width would exceed this.
    pub max_width: u32,
    /// Width used to center each line horizontally.
    pub canvas_width: u32,
    /// Top of the first line.
    pub start_y: i32,
    /// Extra pixels between the bottom of one line and the top of the next.
    pub line_spacing: u32,
}

impl LayoutParams {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_width: config.text.max_line_width,
            canvas_width: config.canvas.size[0],
            start_y: i32::try_from(config.text.start_y).unwrap_or(i32::MAX),
            line_spacing: config.text.line_spacing,
        }
    }
}

/// Output canvas the background is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub fit: CanvasFit,
}

impl CanvasSpec {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let [width, height] = config.canvas.size;
        Self {
            width,
            height,
            fit: config.canvas.fit,
        }
    }
}
