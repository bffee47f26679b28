//! Threads (Meta Graph API).
//!
//! Threads cannot take an image upload; it fetches the image from a public
//! URL. The artifact directory must therefore be served at
//! `publish.threads.public_base_url` and the artifact retained long enough
//! for Meta to fetch it.
//!
//! Posting is two calls: create an IMAGE container, then publish it.

use super::{PostId, PublishCapability, PublishError, UnavailablePlatform, require_secret};
use crate::artifact::Artifact;
use crate::config::{Platform, Secrets, ThreadsConfig};
use crate::http::{HttpClient, HttpRequest, str_field};
use crate::tip::TipText;
use std::sync::Arc;

pub struct ThreadsPublisher {
    api_base: String,
    user_id: String,
    token: String,
    public_base_url: String,
    http: Arc<dyn HttpClient>,
}

impl ThreadsPublisher {
    pub fn from_config(
        config: &ThreadsConfig,
        secrets: &dyn Secrets,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, UnavailablePlatform> {
        let public_base_url = config.public_base_url.trim().trim_end_matches('/');
        if public_base_url.is_empty() {
            return Err(UnavailablePlatform::not_configured(
                Platform::Threads,
                "publish.threads.public_base_url is empty; Threads fetches images by URL",
            ));
        }
        let user_id = require_secret(secrets, Platform::Threads, &config.user_id_env)?;
        let token = require_secret(secrets, Platform::Threads, &config.access_token_env)?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_id,
            token,
            public_base_url: public_base_url.to_string(),
            http,
        })
    }

    fn image_url(&self, artifact: &Artifact) -> String {
        format!("{}/{}", self.public_base_url, artifact.file_name())
    }
}

impl PublishCapability for ThreadsPublisher {
    fn name(&self) -> &str {
        "threads"
    }

    fn publish(&self, text: &TipText, artifact: &Artifact) -> Result<PostId, PublishError> {
        let container = HttpRequest::post(format!("{}/{}/threads", self.api_base, self.user_id))
            .query("media_type", "IMAGE")
            .query("image_url", &self.image_url(artifact))
            .query("text", text.as_str())
            .query("access_token", &self.token);
        let response = self.http.send(container)?;
        let creation_id = str_field(&response, "/id")
            .ok_or_else(|| PublishError::UnexpectedResponse("id in container".into()))?
            .to_string();
        tracing::debug!(creation_id = %creation_id, "created threads container");

        let publish = HttpRequest::post(format!(
            "{}/{}/threads_publish",
            self.api_base, self.user_id
        ))
        .query("creation_id", &creation_id)
        .query("access_token", &self.token);
        let response = self.http.send(publish)?;
        str_field(&response, "/id")
            .map(|id| PostId(id.to_string()))
            .ok_or_else(|| PublishError::UnexpectedResponse("id in threads_publish".into()))
    }
}
