//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `tipcard.toml`. Stock defaults are
//! the base layer; the user file only needs the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [assets]
//! backgrounds_dir = "backgrounds"
//! fonts_dir = "fonts"
//!
//! [canvas]
//! size = [1080, 1080]       # width, height of the published image
//! fit = "stretch"           # "stretch" or "fill" (resize + center crop)
//!
//! [text]
//! font_size = 60.0
//! color = "#ffffff"
//! max_line_width = 900      # wrap width in pixels
//! line_spacing = 10         # extra pixels between lines
//! start_y = 400             # top of the first line
//!
//! [artifact]
//! dir = "."
//! quality = 90              # JPEG quality (1-100)
//! retain = false            # keep the image after publishing
//!
//! [tip]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! timeout_secs = 60
//!
//! [publish]
//! platforms = ["twitter", "bluesky"]
//! parallel = true
//! timeout_secs = 30
//! ```
//!
//! ## Secrets
//!
//! Credentials never live in the file. Each platform section names the
//! environment variables to read; they are resolved once at startup.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration loaded from `tipcard.toml`.
///
/// All fields have defaults matching a 1080×1080 square post with white
/// 60px text. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where backgrounds and fonts are discovered.
    pub assets: AssetsConfig,
    /// Output canvas size and background fit policy.
    pub canvas: CanvasConfig,
    /// Font size, color and layout policy.
    pub text: TextConfig,
    /// Where the composited image is written and whether it is kept.
    pub artifact: ArtifactConfig,
    /// Tip-generation service.
    pub tip: TipConfig,
    /// Platform list and per-platform settings.
    pub publish: PublishConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [width, height] = self.canvas.size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Validation(
                "canvas.size values must be non-zero".into(),
            ));
        }
        if self.text.max_line_width == 0 || self.text.max_line_width > width {
            return Err(ConfigError::Validation(format!(
                "text.max_line_width must be between 1 and the canvas width ({width})"
            )));
        }
        if self.text.start_y >= height {
            return Err(ConfigError::Validation(format!(
                "text.start_y must be below the canvas height ({height})"
            )));
        }
        if !self.text.font_size.is_finite() || self.text.font_size <= 0.0 {
            return Err(ConfigError::Validation(
                "text.font_size must be a positive number".into(),
            ));
        }
        if parse_hex_color(&self.text.color).is_none() {
            return Err(ConfigError::Validation(format!(
                "text.color must be #rgb or #rrggbb, got {:?}",
                self.text.color
            )));
        }
        if !(1..=100).contains(&self.artifact.quality) {
            return Err(ConfigError::Validation(
                "artifact.quality must be 1-100".into(),
            ));
        }
        if self.publish.timeout_secs == 0 || self.tip.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeouts must be at least one second".into(),
            ));
        }
        for (i, platform) in self.publish.platforms.iter().enumerate() {
            if self.publish.platforms[..i].contains(platform) {
                return Err(ConfigError::Validation(format!(
                    "publish.platforms lists {platform} more than once"
                )));
            }
        }
        Ok(())
    }

    /// Text color as RGB. Only valid after [`validate`](Self::validate).
    pub fn text_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.text.color).unwrap_or([255, 255, 255])
    }
}

/// Asset pool directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub backgrounds_dir: PathBuf,
    pub fonts_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            backgrounds_dir: PathBuf::from("backgrounds"),
            fonts_dir: PathBuf::from("fonts"),
        }
    }
}

/// How a background of arbitrary size is normalized onto the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasFit {
    /// Resize to the exact canvas size, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Resize to cover the canvas, then center-crop.
    Fill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    /// Output size as `[width, height]`.
    pub size: [u32; 2],
    pub fit: CanvasFit,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: [1080, 1080],
            fit: CanvasFit::Stretch,
        }
    }
}

/// Text rendering and layout policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Font size in pixels.
    pub font_size: f32,
    /// Hex color, `#rgb` or `#rrggbb`.
    pub color: String,
    /// Maximum rendered line width in pixels before wrapping.
    pub max_line_width: u32,
    /// Extra vertical pixels between consecutive lines.
    pub line_spacing: u32,
    /// Y coordinate of the first line's top edge.
    pub start_y: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_size: 60.0,
            color: "#ffffff".to_string(),
            max_line_width: 900,
            line_spacing: 10,
            start_y: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    /// Directory the composited image is written to.
    pub dir: PathBuf,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u8,
    /// Keep the image on disk after the run instead of deleting it.
    pub retain: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            quality: 90,
            retain: false,
        }
    }
}

/// Chat-completions service used to produce the tip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TipConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub prompt: String,
    pub timeout_secs: u64,
}

pub const DEFAULT_TIP_PROMPT: &str = "Generate a short, useful tip about using AI tools. \
Focus on one of these areas: coding with AI, designing with AI, or writing better prompts. \
Make it concise and practical. Reply with the tip only.";

impl Default for TipConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            prompt: DEFAULT_TIP_PROMPT.to_string(),
            timeout_secs: 60,
        }
    }
}

/// A publishing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Bluesky,
    Threads,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Twitter => "twitter",
            Platform::Bluesky => "bluesky",
            Platform::Threads => "threads",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Platforms to post to, in report order.
    pub platforms: Vec<Platform>,
    /// Run platform calls concurrently on the rayon pool.
    pub parallel: bool,
    /// Per-request timeout for every platform call.
    pub timeout_secs: u64,
    pub twitter: TwitterConfig,
    pub bluesky: BlueskyConfig,
    pub threads: ThreadsConfig,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            platforms: vec![Platform::Twitter, Platform::Bluesky],
            parallel: true,
            timeout_secs: 30,
            twitter: TwitterConfig::default(),
            bluesky: BlueskyConfig::default(),
            threads: ThreadsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwitterConfig {
    pub api_base: String,
    /// Environment variable holding an OAuth 2.0 user access token.
    pub access_token_env: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.x.com".to_string(),
            access_token_env: "TWITTER_ACCESS_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlueskyConfig {
    /// PDS base URL.
    pub service: String,
    pub identifier_env: String,
    pub password_env: String,
    /// Alt text attached to the image embed.
    pub alt_text: String,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            service: "https://bsky.social".to_string(),
            identifier_env: "BLUESKY_EMAIL".to_string(),
            password_env: "BLUESKY_PASSWORD".to_string(),
            alt_text: "AI Tip Image".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadsConfig {
    pub api_base: String,
    pub user_id_env: String,
    pub access_token_env: String,
    /// Public URL prefix under which the artifact directory is served.
    /// Threads fetches images by URL, so this must be set to post there.
    pub public_base_url: String,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.threads.net/v1.0".to_string(),
            user_id_env: "THREADS_USER_ID".to_string(),
            access_token_env: "THREADS_ACCESS_TOKEN".to_string(),
            public_base_url: String::new(),
        }
    }
}

/// Parse `#rgb` or `#rrggbb` into RGB components.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 => Some([
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ]),
        _ => None,
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `tipcard.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tipcard configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Asset pools: one background and one font are picked at random per run
# ---------------------------------------------------------------------------
[assets]
backgrounds_dir = "backgrounds"   # jpg, jpeg, png, tif, tiff, webp
fonts_dir = "fonts"               # ttf, otf

# ---------------------------------------------------------------------------
# Output canvas
# ---------------------------------------------------------------------------
[canvas]
# Width and height of the published image.
size = [1080, 1080]
# "stretch" resizes the background to exactly this size.
# "fill" keeps its aspect ratio and center-crops the overflow.
fit = "stretch"

# ---------------------------------------------------------------------------
# Text
# ---------------------------------------------------------------------------
[text]
font_size = 60.0
color = "#ffffff"
# Lines wrap at word boundaries once they would exceed this width.
# A single word longer than this is kept whole and may overflow.
max_line_width = 900
line_spacing = 10
start_y = 400

# ---------------------------------------------------------------------------
# Artifact
# ---------------------------------------------------------------------------
[artifact]
dir = "."
quality = 90
# Keep the image after the run instead of deleting it.
retain = false

# ---------------------------------------------------------------------------
# Tip generation (OpenAI-compatible chat completions)
# ---------------------------------------------------------------------------
[tip]
endpoint = "https://api.openai.com/v1/chat/completions"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
timeout_secs = 60
# prompt = "..."

# ---------------------------------------------------------------------------
# Publishing
# ---------------------------------------------------------------------------
[publish]
# Any of "twitter", "bluesky", "threads". Each gets exactly one attempt.
platforms = ["twitter", "bluesky"]
parallel = true
timeout_secs = 30

[publish.twitter]
api_base = "https://api.x.com"
access_token_env = "TWITTER_ACCESS_TOKEN"

[publish.bluesky]
service = "https://bsky.social"
identifier_env = "BLUESKY_EMAIL"
password_env = "BLUESKY_PASSWORD"
alt_text = "AI Tip Image"

[publish.threads]
api_base = "https://graph.threads.net/v1.0"
user_id_env = "THREADS_USER_ID"
access_token_env = "THREADS_ACCESS_TOKEN"
# Threads fetches the image by URL: serve artifact.dir here and set
# artifact.retain = true.
public_base_url = ""
"##
}

// =============================================================================
// Secrets
// =============================================================================

/// Resolves a credential by the environment-variable name the config gives.
pub trait Secrets: Send + Sync {
    fn secret(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment. Empty values count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl Secrets for EnvSecrets {
    fn secret(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

impl Secrets for std::collections::HashMap<String, String> {
    fn secret(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.trim().is_empty()).cloned()
    }
}
