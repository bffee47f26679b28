//! Publisher fan-out.
//!
//! One artifact, N platforms, N independent attempts. Every configured
//! platform is a [`PublishCapability`]; [`publish_all`] calls each exactly
//! once and folds the results into a [`PublishReport`] that always has one
//! outcome per platform, in configured order.
//!
//! ## Isolation
//!
//! A platform's failure, whether an error return or a panic inside the
//! adapter, is captured into that platform's [`PublishOutcome`] and logged at
//! `warn`. It never stops the remaining platforms and never escapes
//! `publish_all`.
//!
//! ## Concurrency
//!
//! In [`FanOut::Parallel`] mode the calls run on the rayon pool. The only
//! shared state is the immutable tip text and artifact. `par_iter().collect()`
//! keeps input order, so the report order does not depend on which platform
//! finishes first.
//!
//! ## Adapters
//!
//! | Platform | Module | Flow |
//! |---|---|---|
//! | Twitter/X | [`twitter`] | media upload → create tweet |
//! | Bluesky | [`bluesky`] | create session → upload blob → create record |
//! | Threads | [`threads`] | create container (by image URL) → publish |
//!
//! A platform whose credentials are missing is still listed, as an
//! [`UnavailablePlatform`] whose every attempt fails with the reason.

pub mod bluesky;
pub mod threads;
pub mod twitter;

use crate::artifact::Artifact;
use crate::config::{Platform, PublishConfig, Secrets};
use crate::http::{HttpClient, HttpError};
use crate::tip::TipText;
use rayon::prelude::*;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

pub use bluesky::BlueskyPublisher;
pub use threads::ThreadsPublisher;
pub use twitter::TwitterPublisher;

/// Platform-assigned identifier of a created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Missing credential: ${0} is not set")]
    MissingCredential(String),
    #[error("Not configured: {0}")]
    NotConfigured(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("Unexpected response: missing {0}")]
    UnexpectedResponse(String),
    #[error("Adapter panicked: {0}")]
    Panicked(String),
}

/// Something that can post a tip and its image to one platform.
pub trait PublishCapability: Send + Sync {
    fn name(&self) -> &str;
    fn publish(&self, text: &TipText, artifact: &Artifact) -> Result<PostId, PublishError>;

    /// Why this platform cannot publish, known without a network call.
    fn unavailable_reason(&self) -> Option<String> {
        None
    }
}

/// Result of one platform attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub platform: String,
    pub success: bool,
    pub post_id: Option<PostId>,
    pub error: Option<String>,
}

impl PublishOutcome {
    fn from_result(platform: &str, result: Result<PostId, PublishError>) -> Self {
        match result {
            Ok(id) => {
                tracing::info!(platform, post_id = %id, "published");
                Self {
                    platform: platform.to_string(),
                    success: true,
                    post_id: Some(id),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(platform, error = %e, "publish failed");
                Self {
                    platform: platform.to_string(),
                    success: false,
                    post_id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// One outcome per configured platform, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub outcomes: Vec<PublishOutcome>,
}

impl PublishReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &PublishOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PublishOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    Sequential,
    Parallel,
}

impl FanOut {
    pub fn from_config(config: &PublishConfig) -> Self {
        if config.parallel {
            FanOut::Parallel
        } else {
            FanOut::Sequential
        }
    }
}

/// Attempt every platform once. Never fails as a whole.
pub fn publish_all(
    text: &TipText,
    artifact: &Artifact,
    platforms: &[Box<dyn PublishCapability>],
    mode: FanOut,
) -> PublishReport {
    let attempt = |platform: &Box<dyn PublishCapability>| {
        let name = platform.name();
        tracing::debug!(platform = name, "publishing");
        let result = panic::catch_unwind(AssertUnwindSafe(|| platform.publish(text, artifact)))
            .unwrap_or_else(|payload| Err(PublishError::Panicked(panic_message(&*payload))));
        PublishOutcome::from_result(name, result)
    };

    let outcomes = match mode {
        FanOut::Sequential => platforms.iter().map(attempt).collect(),
        FanOut::Parallel => platforms.par_iter().map(attempt).collect(),
    };
    PublishReport { outcomes }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A configured platform that cannot be used this run.
#[derive(Debug)]
pub struct UnavailablePlatform {
    name: String,
    reason: UnavailableReason,
}

#[derive(Debug, Clone)]
enum UnavailableReason {
    MissingCredential(String),
    NotConfigured(String),
}

impl UnavailablePlatform {
    pub fn missing_credential(platform: Platform, var: &str) -> Self {
        Self {
            name: platform.to_string(),
            reason: UnavailableReason::MissingCredential(var.to_string()),
        }
    }

    pub fn not_configured(platform: Platform, detail: &str) -> Self {
        Self {
            name: platform.to_string(),
            reason: UnavailableReason::NotConfigured(detail.to_string()),
        }
    }
}

impl PublishCapability for UnavailablePlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, _text: &TipText, _artifact: &Artifact) -> Result<PostId, PublishError> {
        Err(self.error())
    }

    fn unavailable_reason(&self) -> Option<String> {
        Some(self.error().to_string())
    }
}

impl UnavailablePlatform {
    fn error(&self) -> PublishError {
        match &self.reason {
            UnavailableReason::MissingCredential(var) => {
                PublishError::MissingCredential(var.clone())
            }
            UnavailableReason::NotConfigured(detail) => PublishError::NotConfigured(detail.clone()),
        }
    }
}

/// Build one capability per configured platform, in configured order.
pub fn build_platforms(
    config: &PublishConfig,
    secrets: &dyn Secrets,
    http: Arc<dyn HttpClient>,
) -> Vec<Box<dyn PublishCapability>> {
    config
        .platforms
        .iter()
        .map(|&platform| {
            let built = match platform {
                Platform::Twitter => {
                    TwitterPublisher::from_config(&config.twitter, secrets, http.clone())
                        .map(|p| Box::new(p) as Box<dyn PublishCapability>)
                }
                Platform::Bluesky => {
                    BlueskyPublisher::from_config(&config.bluesky, secrets, http.clone())
                        .map(|p| Box::new(p) as Box<dyn PublishCapability>)
                }
                Platform::Threads => {
                    ThreadsPublisher::from_config(&config.threads, secrets, http.clone())
                        .map(|p| Box::new(p) as Box<dyn PublishCapability>)
                }
            };
            built.unwrap_or_else(|unavailable| {
                tracing::warn!(%platform, reason = ?unavailable.reason, "platform unavailable");
                Box::new(unavailable)
            })
        })
        .collect()
}

/// Resolve a credential or explain which variable is missing.
pub(crate) fn require_secret(
    secrets: &dyn Secrets,
    platform: Platform,
    var: &str,
) -> Result<String, UnavailablePlatform> {
    secrets
        .secret(var)
        .ok_or_else(|| UnavailablePlatform::missing_credential(platform, var))
}
