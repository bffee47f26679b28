//! Text layout and image composition: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Measure** | `rusttype` glyph layout, union of pixel bounding boxes |
//! | **Wrap + place** | greedy word wrap in [`layout`] |
//! | **Normalize background** | `image` resize with Lanczos3 |
//! | **Draw** | `rusttype` glyph coverage, source-over blend |
//!
//! The module is split into:
//! - **Calculations**: Pure placement arithmetic (unit testable)
//! - **Parameters**: Data structures describing layout and canvas policy
//! - **Font**: [`TextMeasure`] trait + [`FontSpec`]
//! - **Layout**: Word wrap producing a [`LayoutPlan`]
//! - **Compose**: Drawing a plan onto a background

mod calculations;
pub mod compose;
pub mod font;
pub mod layout;
mod params;

pub use calculations::{center_offset, line_tops};
pub use compose::{compose, normalize_background};
pub use font::{FontSpec, RenderError, TextExtent, TextMeasure};
pub use layout::{LayoutError, LayoutLine, LayoutPlan, layout};
pub use params::{CanvasSpec, LayoutParams, Quality};
