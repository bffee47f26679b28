//! Bluesky (AT Protocol).
//!
//! Each publish opens a fresh session with the account identifier and app
//! password, uploads the JPEG as a blob, and creates an `app.bsky.feed.post`
//! record whose embed references that blob. The record's `uri` is the post id.

use super::{PostId, PublishCapability, PublishError, UnavailablePlatform, require_secret};
use crate::artifact::Artifact;
use crate::config::{BlueskyConfig, Platform, Secrets};
use crate::http::{HttpClient, HttpRequest, str_field};
use crate::tip::TipText;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

pub struct BlueskyPublisher {
    service: String,
    identifier: String,
    password: String,
    alt_text: String,
    http: Arc<dyn HttpClient>,
}

struct Session {
    access_jwt: String,
    did: String,
}

impl BlueskyPublisher {
    pub fn from_config(
        config: &BlueskyConfig,
        secrets: &dyn Secrets,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, UnavailablePlatform> {
        let identifier = require_secret(secrets, Platform::Bluesky, &config.identifier_env)?;
        let password = require_secret(secrets, Platform::Bluesky, &config.password_env)?;
        Ok(Self {
            service: config.service.trim_end_matches('/').to_string(),
            identifier,
            password,
            alt_text: config.alt_text.clone(),
            http,
        })
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{method}", self.service)
    }

    fn create_session(&self) -> Result<Session, PublishError> {
        let request = HttpRequest::post(self.xrpc("com.atproto.server.createSession")).json(json!({
            "identifier": self.identifier,
            "password": self.password,
        }));
        let response = self.http.send(request)?;
        let field = |name: &str| {
            str_field(&response, &format!("/{name}"))
                .map(str::to_string)
                .ok_or_else(|| PublishError::UnexpectedResponse(format!("{name} in session")))
        };
        Ok(Session {
            access_jwt: field("accessJwt")?,
            did: field("did")?,
        })
    }

    fn upload_blob(&self, session: &Session, artifact: &Artifact) -> Result<Value, PublishError> {
        let request = HttpRequest::post(self.xrpc("com.atproto.repo.uploadBlob"))
            .bearer(&session.access_jwt)
            .bytes(artifact.media_type(), artifact.bytes().to_vec());
        let mut response = self.http.send(request)?;
        match response.get_mut("blob").map(Value::take) {
            Some(blob) if blob.is_object() => Ok(blob),
            _ => Err(PublishError::UnexpectedResponse("blob in upload".into())),
        }
    }
}

impl PublishCapability for BlueskyPublisher {
    fn name(&self) -> &str {
        "bluesky"
    }

    fn publish(&self, text: &TipText, artifact: &Artifact) -> Result<PostId, PublishError> {
        let session = self.create_session()?;
        let blob = self.upload_blob(&session, artifact)?;
        let (width, height) = artifact.dimensions();

        let record = json!({
            "$type": "app.bsky.feed.post",
            "text": text.as_str(),
            "createdAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "embed": {
                "$type": "app.bsky.embed.images",
                "images": [{
                    "alt": self.alt_text,
                    "image": blob,
                    "aspectRatio": {"width": width, "height": height},
                }],
            },
        });
        let request = HttpRequest::post(self.xrpc("com.atproto.repo.createRecord"))
            .bearer(&session.access_jwt)
            .json(json!({
                "repo": session.did,
                "collection": "app.bsky.feed.post",
                "record": record,
            }));
        let response = self.http.send(request)?;
        str_field(&response, "/uri")
            .map(|uri| PostId(uri.to_string()))
            .ok_or_else(|| PublishError::UnexpectedResponse("uri in createRecord".into()))
    }
}
