//! Blocking HTTP seam shared by the tip source and every platform adapter.
//!
//! Adapters build an [`HttpRequest`] and hand it to an [`HttpClient`]. The
//! production client is [`ReqwestClient`]; tests substitute a recording mock so
//! no adapter test touches the network.
//!
//! Every response body is decoded as JSON. An empty body decodes to
//! [`Value::Null`]. Non-2xx statuses become [`HttpError::Status`] carrying a
//! truncated copy of the body for diagnostics.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("tipcard/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in [`HttpError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// A file part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Bytes { content_type: String, data: Vec<u8> },
    Multipart {
        fields: Vec<(String, String)>,
        file: MultipartFile,
    },
}

/// One POST request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer: None,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn bytes(mut self, content_type: &str, data: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes {
            content_type: content_type.to_string(),
            data,
        };
        self
    }

    pub fn multipart(mut self, fields: Vec<(String, String)>, file: MultipartFile) -> Self {
        self.body = RequestBody::Multipart { fields, file };
        self
    }
}

/// Sends requests and decodes JSON responses.
pub trait HttpClient: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<Value, HttpError>;
}

/// Real client backed by `reqwest::blocking`. The timeout covers the whole
/// request including reading the body.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Transport {
                url: String::new(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            HttpError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: HttpRequest) -> Result<Value, HttpError> {
        let HttpRequest {
            url,
            bearer,
            query,
            body,
        } = request;

        let mut builder = self.client.post(&url);
        if let Some(token) = &bearer {
            builder = builder.bearer_auth(token);
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Bytes { content_type, data } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(data),
            RequestBody::Multipart { fields, file } => {
                let part = reqwest::blocking::multipart::Part::bytes(file.data)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|e| self.map_error(&url, e))?;
                let form = fields
                    .into_iter()
                    .fold(reqwest::blocking::multipart::Form::new(), |form, (k, v)| {
                        form.text(k, v)
                    })
                    .part(file.field, part);
                builder.multipart(form)
            }
        };

        tracing::debug!(%url, "POST");
        let response = builder.send().map_err(|e| self.map_error(&url, e))?;
        let status = response.status();
        let text = response.text().map_err(|e| self.map_error(&url, e))?;

        if !status.is_success() {
            return Err(HttpError::Status {
                url,
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }
        parse_body(&url, &text)
    }
}

/// Decode a response body, treating an empty body as `null`.
pub fn parse_body(url: &str, text: &str) -> Result<Value, HttpError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| HttpError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// String value at a JSON pointer, if present.
pub fn str_field<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}
