//! Error taxonomy shared by the HTTP adapter, session store, and views.
//!
//! ERROR HANDLING
//! ==============
//! Transport-level failures are `ApiError`; session operations surface
//! `AuthError`; form checks produce `ValidationError` before any request is
//! sent. Views convert all of these into a generic message via
//! [`user_message`] and log the detail.

/// A form field that failed a local check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    #[must_use]
    pub fn required(field: &'static str) -> Self {
        Self { field, reason: "is required".to_owned() }
    }

    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }
}

/// Failure of a single HTTP exchange with the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("authentication rejected")]
    Unauthorized,
    #[error("session expired")]
    SessionExpired,
    #[error("not found")]
    NotFound,
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failure of a session store operation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session expired")]
    SessionExpired,
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("operation not permitted while session is {0}")]
    InvalidState(&'static str),
    #[error("superseded by a newer session change")]
    Superseded,
    #[error("server error: {0}")]
    Server(String),
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    /// Map a failed login/register exchange onto the auth taxonomy.
    #[must_use]
    pub fn from_credentials_exchange(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized | ApiError::Status { status: 403, .. } => Self::InvalidCredentials,
            ApiError::Network(message) => Self::NetworkFailure(message),
            ApiError::Cancelled => Self::Superseded,
            ApiError::Validation(v) => Self::Validation(v),
            other => Self::Server(other.to_string()),
        }
    }
}

/// Generic text shown to the user; details belong in the log.
#[must_use]
pub fn user_message(err: &ApiError) -> &'static str {
    match err {
        ApiError::Network(_) => "Could not reach the server. Please try again.",
        ApiError::Unauthorized | ApiError::SessionExpired => "Your session has expired. Please log in again.",
        ApiError::NotFound => "The requested item could not be found.",
        ApiError::Validation(_) => "Please check the form and try again.",
        ApiError::Status { .. } | ApiError::Decode(_) | ApiError::Cancelled | ApiError::Io(_) => {
            "Something went wrong. Please try again."
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
