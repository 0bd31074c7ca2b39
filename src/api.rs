//! Persistence boundary: each "Continue" sends one request with the step's
//! API-shaped body and waits for `{ success, data }`.

use crate::config::ClientConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Patch,
    Put,
}

/// Where a step is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// Relative to the configured base URL.
    pub path: String,
}

impl Endpoint {
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
        }
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Patch,
            path: path.into(),
        }
    }
}

/// One step submission, already in API shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRequest {
    pub endpoint: Endpoint,
    /// snake_case JSON body.
    pub body: Value,
}

/// Envelope every step endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout or TLS failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-2xx status; `message` comes from the body when it has one.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Sends a step to the backend. Implementations report `success: false` as
/// either `Ok` or `Err`; the controller checks the envelope again.
#[async_trait]
pub trait StepPersistence: Send + Sync {
    async fn persist(&self, request: &StepRequest) -> Result<ApiResponse, ApiError>;
}

/// `success: false` is a failure even when the HTTP status was 2xx.
pub fn check_response(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.success {
        Ok(response)
    } else {
        Err(ApiError::Rejected(
            response
                .message
                .unwrap_or_else(|| "Request was not successful".to_string()),
        ))
    }
}

/// [`StepPersistence`] over HTTP with `reqwest`.
pub struct HttpPersistence {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpPersistence {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn endpoint_url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        self.base_url
            .join(endpoint.path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", endpoint.path)))
    }
}

#[async_trait]
impl StepPersistence for HttpPersistence {
    async fn persist(&self, request: &StepRequest) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint_url(&request.endpoint)?;
        log::debug!("{:?} {}", request.endpoint.method, url);

        let builder = match request.endpoint.method {
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Patch => self.client.patch(url),
            HttpMethod::Put => self.client.put(url),
        };
        let builder = match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.json(&request.body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiResponse>(&text)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            log::warn!("step request failed with status {}: {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ApiResponse = response.json().await?;
        check_response(body)
    }
}
