//! Auth endpoints consumed by the session store.

use reqwest::Method;

use crate::error::ApiError;
use crate::net::http::HttpClient;
use crate::net::types::{AuthResponse, LoginRequest, RegisterRequest, User};

/// The slice of the backend the session store talks to. Tests substitute a
/// scripted double.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
    async fn fetch_profile(&self, token: &str) -> Result<User, ApiError>;
}

#[async_trait::async_trait]
impl AuthBackend for HttpClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let req = self.request(Method::POST, "/auth/login", None).json(request);
        self.send_json(req).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let req = self.request(Method::POST, "/auth/register", None).json(request);
        self.send_json(req).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let req = self.request(Method::POST, "/auth/logout", Some(token));
        self.send_empty(req).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<User, ApiError> {
        let req = self.request(Method::GET, "/users/profile", Some(token));
        self.send_json(req).await
    }
}
