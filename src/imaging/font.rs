//! Font loading and text measurement.
//!
//! [`TextMeasure`] is the only thing the layout engine needs from a font: the
//! pixel bounding box of a string. [`FontSpec`] implements it with `rusttype`
//! by laying out the glyphs and taking the union of their ink boxes, which is
//! what the compositor later draws.

use rusttype::{Font, PositionedGlyph, Rect, Scale, point};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a usable TrueType/OpenType font: {0}")]
    InvalidFont(PathBuf),
    #[error("Font {path} cannot be rasterized at size {size}")]
    InvalidSize { path: PathBuf, size: f32 },
}

/// Rendered size of a string, in whole pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Anything that can report the rendered pixel size of a string.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> TextExtent;
}

/// A parsed font face at a fixed pixel size.
#[derive(Clone)]
pub struct FontSpec {
    path: PathBuf,
    size: f32,
    face: Font<'static>,
}

impl fmt::Debug for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSpec")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish()
    }
}

impl FontSpec {
    /// Read and parse a font file.
    pub fn load(path: &Path, size: f32) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, bytes, size)
    }

    /// Parse font data already in memory. `path` is only used for reporting.
    pub fn from_bytes(path: &Path, bytes: Vec<u8>, size: f32) -> Result<Self, RenderError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(RenderError::InvalidSize {
                path: path.to_path_buf(),
                size,
            });
        }
        let face =
            Font::try_from_vec(bytes).ok_or_else(|| RenderError::InvalidFont(path.to_path_buf()))?;
        Ok(Self {
            path: path.to_path_buf(),
            size,
            face,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub(crate) fn scale(&self) -> Scale {
        Scale::uniform(self.size)
    }

    /// Glyphs for `text` with the pen at the origin and the baseline one
    /// ascent below it.
    pub(crate) fn positioned_glyphs(&self, text: &str) -> Vec<PositionedGlyph<'static>> {
        let scale = self.scale();
        let ascent = self.face.v_metrics(scale).ascent;
        self.face.layout(text, scale, point(0.0, ascent)).collect()
    }

    /// Characters in `text` this face has no glyph for.
    pub fn missing_glyphs(&self, text: &str) -> Vec<char> {
        let mut missing: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace() && self.face.glyph(*c).id().0 == 0)
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

impl TextMeasure for FontSpec {
    fn measure(&self, text: &str) -> TextExtent {
        match ink_bounds(&self.positioned_glyphs(text)) {
            Some(bounds) => TextExtent {
                width: (bounds.max.x - bounds.min.x) as u32,
                height: (bounds.max.y - bounds.min.y) as u32,
            },
            None => TextExtent::default(),
        }
    }
}

/// Union of the pixel bounding boxes of all glyphs with ink.
///
/// Returns `None` for whitespace-only or empty input.
pub(crate) fn ink_bounds(glyphs: &[PositionedGlyph<'_>]) -> Option<Rect<i32>> {
    glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        })
}
