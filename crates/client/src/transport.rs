//! Backend transport contract.
//!
//! The shell talks to the backend through a single call,
//! `request(path, options) -> { data, error }`. Authentication of the call
//! (cookie, bearer token) is the transport's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
        }
    }

    pub fn post(body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            body,
        }
    }

    pub fn patch(body: Value) -> Self {
        Self {
            method: Method::Patch,
            body: Some(body),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Outcome of a request: payload, error, or neither (empty body).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiResponse {
    pub data: Option<Value>,
    pub error: Option<TransportError>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(error: TransportError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// An error wins over data.
    pub fn into_result(self) -> Result<Option<Value>, TransportError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data.filter(|v| !v.is_null())),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, path: &str, options: RequestOptions) -> ApiResponse;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::{ApiResponse, Method, RequestOptions, Transport, TransportError};

    /// `reqwest`-backed transport.
    ///
    /// Responses are expected as `{ "data": ... }` envelopes; a body without
    /// `data` yields an empty response.
    pub struct HttpTransport {
        client: reqwest::Client,
        base_url: String,
        token: Option<String>,
    }

    impl HttpTransport {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(Self {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                token: None,
            })
        }

        pub fn with_token(mut self, token: impl Into<String>) -> Self {
            self.token = Some(token.into());
            self
        }

        async fn send(&self, path: &str, options: RequestOptions) -> Result<Option<Value>, TransportError> {
            let url = format!("{}{}", self.base_url, path);
            let mut req = match options.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
                Method::Patch => self.client.patch(&url),
                Method::Delete => self.client.delete(&url),
            };

            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
            if let Some(body) = &options.body {
                req = req.json(body);
            }

            let resp = req.send().await.map_err(|e| TransportError::Network(e.to_string()))?;
            let status = resp.status();
            let text = resp.text().await.map_err(|e| TransportError::Network(e.to_string()))?;

            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    message: text,
                });
            }
            if text.trim().is_empty() {
                return Ok(None);
            }

            let body: Value =
                serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?;
            Ok(body.get("data").cloned())
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn request(&self, path: &str, options: RequestOptions) -> ApiResponse {
            let method = options.method;
            match self.send(path, options).await {
                Ok(Some(data)) => ApiResponse::ok(data),
                Ok(None) => ApiResponse::empty(),
                Err(err) => {
                    tracing::debug!(?method, path, %err, "request failed");
                    ApiResponse::failed(err)
                }
            }
        }
    }
}
