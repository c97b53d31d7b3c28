//! HTTP client adapter for the job-board backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every outbound request goes through [`HttpClient`]: it joins paths onto
//! one configured base URL, attaches `Authorization: Bearer <token>` when the
//! caller supplies a token, tags the request with an `X-Request-Id`, and maps
//! non-success statuses onto [`ApiError`].
//!
//! ERROR HANDLING
//! ==============
//! A 401 is reported as `ApiError::Unauthorized` and nothing else happens
//! here; deciding whether that ends the session is the caller's job.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::{ClientConfig, normalize_base_url};
use crate::error::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared `reqwest` client bound to one backend base URL.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Build a client with the configured base URL and timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the underlying client cannot be built
    /// (e.g. TLS backend initialisation failure).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()?;
        Ok(Self { client, base_url: normalize_base_url(&config.base_url) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/jobs/42`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Start a request. The bearer header is set only when `bearer` holds a
    /// non-empty token.
    pub fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(%method, %path, %request_id, authenticated = bearer.is_some(), "http request");

        let builder = self
            .client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, request_id);
        match bearer.filter(|token| !token.is_empty()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, non-success statuses,
    /// or bodies that do not decode as `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = execute(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request whose response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures or non-success statuses.
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        execute(request).await?;
        Ok(())
    }
}

async fn execute(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_owned();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %url, "backend rejected request");
    Err(status_error(status, &body))
}

/// Map a non-success status (and its body) onto the error taxonomy.
pub(crate) fn status_error(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        _ => ApiError::Status { status: status.as_u16(), message: error_message(body) },
    }
}

/// Prefer a `message`/`error` field from a JSON error body; fall back to raw text.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = parsed.as_ref().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned)
    });
    field.unwrap_or_else(|| body.trim().to_owned())
}
