//! Tip generation.
//!
//! A [`TipSource`] produces the raw text for one run. [`OpenAiTipSource`]
//! asks an OpenAI-compatible chat-completions endpoint; [`StaticTipSource`]
//! returns text supplied on the command line. Either way the result is
//! normalized into a [`TipText`] before it reaches layout.

use crate::config::{Secrets, TipConfig};
use crate::http::{HttpClient, HttpError, HttpRequest};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TipError {
    #[error("Tip API key not set (expected in ${0})")]
    MissingApiKey(String),
    #[error("Tip request failed: {0}")]
    Http(#[from] HttpError),
    #[error("Tip service returned an unexpected payload: {0}")]
    Malformed(String),
    #[error("Tip service returned no text")]
    EmptyResponse,
}

/// The tip for one run: trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipText(String);

impl TipText {
    /// Trim surrounding whitespace and a single pair of wrapping quotes.
    pub fn new(raw: &str) -> Result<Self, TipError> {
        let trimmed = raw.trim();
        let unquoted = strip_quotes(trimmed).trim();
        if unquoted.is_empty() {
            return Err(TipError::EmptyResponse);
        }
        Ok(Self(unquoted.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn strip_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|r| r.strip_suffix(close)) {
            return inner;
        }
    }
    s
}

impl fmt::Display for TipText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TipText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub trait TipSource: Send + Sync {
    fn generate_tip(&self) -> Result<String, TipError>;
}

/// Returns the same text every time.
#[derive(Debug, Clone)]
pub struct StaticTipSource(pub String);

impl TipSource for StaticTipSource {
    fn generate_tip(&self) -> Result<String, TipError> {
        Ok(self.0.clone())
    }
}

pub struct OpenAiTipSource {
    endpoint: String,
    model: String,
    prompt: String,
    api_key: String,
    http: Arc<dyn HttpClient>,
}

impl OpenAiTipSource {
    /// Resolve the API key and capture the request parameters.
    pub fn from_config(
        config: &TipConfig,
        secrets: &dyn Secrets,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, TipError> {
        let api_key = secrets
            .secret(&config.api_key_env)
            .ok_or_else(|| TipError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            api_key,
            http,
        })
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl TipSource for OpenAiTipSource {
    fn generate_tip(&self) -> Result<String, TipError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": self.prompt}],
        });
        let request = HttpRequest::post(&self.endpoint)
            .bearer(&self.api_key)
            .json(body);
        let response = self.http.send(request)?;

        let completion: ChatCompletion =
            serde_json::from_value(response).map_err(|e| TipError::Malformed(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(TipError::EmptyResponse)?;
        tracing::debug!(model = %self.model, chars = content.len(), "received tip");
        Ok(content)
    }
}
