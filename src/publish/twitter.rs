//! Twitter/X: upload the image, then post a tweet referencing it.
//!
//! Authenticates with an OAuth 2.0 user-context bearer token.

use super::{PostId, PublishCapability, PublishError, UnavailablePlatform, require_secret};
use crate::artifact::Artifact;
use crate::config::{Platform, Secrets, TwitterConfig};
use crate::http::{HttpClient, HttpRequest, MultipartFile, str_field};
use crate::tip::TipText;
use serde_json::json;
use std::sync::Arc;

pub struct TwitterPublisher {
    api_base: String,
    token: String,
    http: Arc<dyn HttpClient>,
}

impl TwitterPublisher {
    pub fn from_config(
        config: &TwitterConfig,
        secrets: &dyn Secrets,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, UnavailablePlatform> {
        let token = require_secret(secrets, Platform::Twitter, &config.access_token_env)?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    fn upload_media(&self, artifact: &Artifact) -> Result<String, PublishError> {
        let request = HttpRequest::post(format!("{}/2/media/upload", self.api_base))
            .bearer(&self.token)
            .multipart(
                vec![("media_category".into(), "tweet_image".into())],
                MultipartFile {
                    field: "media".into(),
                    file_name: artifact.file_name().to_string(),
                    content_type: artifact.media_type().to_string(),
                    data: artifact.bytes().to_vec(),
                },
            );
        let response = self.http.send(request)?;
        str_field(&response, "/data/id")
            .map(str::to_string)
            .ok_or_else(|| PublishError::UnexpectedResponse("data.id in media upload".into()))
    }
}

impl PublishCapability for TwitterPublisher {
    fn name(&self) -> &str {
        "twitter"
    }

    fn publish(&self, text: &TipText, artifact: &Artifact) -> Result<PostId, PublishError> {
        let media_id = self.upload_media(artifact)?;
        tracing::debug!(media_id = %media_id, "uploaded media to twitter");

        let request = HttpRequest::post(format!("{}/2/tweets", self.api_base))
            .bearer(&self.token)
            .json(json!({
                "text": text.as_str(),
                "media": {"media_ids": [media_id]},
            }));
        let response = self.http.send(request)?;
        str_field(&response, "/data/id")
            .map(|id| PostId(id.to_string()))
            .ok_or_else(|| PublishError::UnexpectedResponse("data.id in tweet".into()))
    }
}
