//! Shared test utilities for the tipcard test suite.
//!
//! Provides deterministic stand-ins for every external seam: a fixed-advance
//! text measurer, a scripted HTTP client, and publishers that succeed, fail
//! or panic on demand.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let http = Arc::new(MockHttp::new());
//! http.respond(json!({"data": {"id": "1"}}));
//! // ... exercise an adapter ...
//! assert_eq!(http.requests()[0].url, "https://api.x.com/2/media/upload");
//! ```

use crate::artifact::Artifact;
use crate::http::{HttpClient, HttpError, HttpRequest};
use crate::imaging::{FontSpec, Quality, TextExtent, TextMeasure};
use crate::publish::{PostId, PublishCapability, PublishError};
use crate::tip::TipText;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// =========================================================================
// Text measurement
// =========================================================================

/// Every character, spaces included, is `char_width` pixels wide. Text with
/// no visible character has no ink and measures zero.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub char_width: u32,
    pub height: u32,
}

impl FixedAdvance {
    pub fn new(char_width: u32, height: u32) -> Self {
        Self { char_width, height }
    }
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self::new(12, 20)
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str) -> TextExtent {
        if text.chars().all(char::is_whitespace) {
            return TextExtent::default();
        }
        TextExtent {
            width: text.chars().count() as u32 * self.char_width,
            height: self.height,
        }
    }
}

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Path of the first installed font from a list of common locations.
pub fn system_font_path() -> Option<&'static Path> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
}

/// A real font for rasterization tests, or `None` when the machine has none.
pub fn system_font(size: f32) -> Option<FontSpec> {
    FontSpec::load(system_font_path()?, size).ok()
}

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a small gradient image; the format follows the extension.
pub fn write_background(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 120])
    });
    img.save(path).unwrap();
}

/// A non-retained artifact in `dir`, removed when dropped.
pub fn sample_artifact(dir: &Path) -> Artifact {
    let canvas = RgbaImage::from_pixel(24, 24, Rgba([30, 60, 90, 255]));
    Artifact::write(&canvas, &dir.join("sample.jpg"), Quality::default(), false).unwrap()
}

// =========================================================================
// HTTP
// =========================================================================

/// Scripted HTTP client: replies are popped in order, requests are recorded.
/// An unscripted request fails with a transport error.
#[derive(Default)]
pub struct MockHttp {
    replies: Mutex<VecDeque<Result<Value, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, body: Value) {
        self.replies.lock().unwrap().push_back(Ok(body));
    }

    pub fn fail(&self, error: HttpError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockHttp {
    fn send(&self, request: HttpRequest) -> Result<Value, HttpError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(HttpError::Transport {
                    url,
                    message: "no scripted reply".into(),
                })
            })
    }
}

// =========================================================================
// Publishers
// =========================================================================

/// Succeeds with `"{name}-{n}"`, counting calls.
pub struct RecordingPublisher {
    name: String,
    calls: Arc<AtomicUsize>,
}

impl RecordingPublisher {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter, still readable after the publisher is boxed.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PublishCapability for RecordingPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, _text: &TipText, artifact: &Artifact) -> Result<PostId, PublishError> {
        assert!(!artifact.bytes().is_empty());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PostId(format!("{}-{n}", self.name)))
    }
}

/// Always fails with an HTTP 429 carrying `message`.
pub struct FailingPublisher {
    name: String,
    message: String,
}

impl FailingPublisher {
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
        }
    }
}

impl PublishCapability for FailingPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, _text: &TipText, _artifact: &Artifact) -> Result<PostId, PublishError> {
        Err(PublishError::Http(HttpError::Status {
            url: format!("https://{}.test/post", self.name),
            status: 429,
            body: self.message.clone(),
        }))
    }
}

/// Panics inside `publish`.
pub struct PanickingPublisher {
    name: String,
}

impl PanickingPublisher {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl PublishCapability for PanickingPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, _text: &TipText, _artifact: &Artifact) -> Result<PostId, PublishError> {
        panic!("{} adapter exploded", self.name)
    }
}
