//! # tipcard
//!
//! Generates a short tip, renders it onto a randomly chosen background as a
//! square social-media graphic, and posts the pair to several platforms.
//!
//! # Architecture: One Sequential Run
//!
//! ```text
//! 1. Tip       tip source        →  TipText
//! 2. Assets    backgrounds/ fonts/  →  BackgroundAsset + FontSpec
//! 3. Layout    text + font       →  LayoutPlan      (greedy wrap, per-line centering)
//! 4. Compose   background + plan →  Artifact        (JPEG on disk, drop-guarded)
//! 5. Publish   artifact          →  PublishReport   (one outcome per platform)
//! ```
//!
//! Stages 1–4 are fatal on error. Stage 5 never fails: every platform gets one
//! attempt and its result, good or bad, is one line in the report.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tip`] | Tip sources: OpenAI chat completions, or fixed text |
//! | [`assets`] | Background and font pools, seeded random selection |
//! | [`imaging`] | Pure-Rust text measurement, word wrap, compositing |
//! | [`artifact`] | JPEG encoding and the self-deleting artifact file |
//! | [`publish`] | Platform adapters and the isolated fan-out |
//! | [`http`] | Blocking HTTP seam shared by the tip source and adapters |
//! | [`pipeline`] | Sequences the stages and owns the artifact's lifetime |
//! | [`config`] | `tipcard.toml` loading, validation, merging; secrets lookup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Measure What Is Drawn
//!
//! Layout measures a candidate line by laying out its glyphs with `rusttype`
//! and taking the union of their pixel bounding boxes. The compositor draws
//! from the same glyph layout, shifted so that box lands on the planned
//! corner. Measured and drawn extents therefore cannot disagree.
//!
//! ## Overflow Over Truncation
//!
//! A single word wider than the wrap width is kept whole on its own line and
//! centered with a negative x if needed. Losing part of a tip is worse than a
//! clipped edge, and the alternative (hyphenation) is out of scope.
//!
//! ## Capabilities, Not SDKs
//!
//! Every platform is a [`publish::PublishCapability`] with a single `publish`
//! method. The fan-out is written once against that trait; adapters only
//! translate to their wire protocol through [`http::HttpClient`]. Tests swap
//! both seams for in-memory fakes.
//!
//! ## Cleanup By Ownership
//!
//! The artifact file is removed by [`artifact::Artifact`]'s `Drop`. There is
//! no cleanup call to forget on an early return.

pub mod artifact;
pub mod assets;
pub mod config;
pub mod http;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod tip;

#[cfg(test)]
pub(crate) mod test_helpers;
