//! Typed REST endpoints used by the views.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`JobBoardApi`] pairs the HTTP adapter with the session store: it reads
//! the current bearer token for each call, and when a call made with that
//! token is rejected (401) it expires the session and reports
//! `ApiError::SessionExpired`. That is the only place outside the session
//! store where session state changes.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::path::Path;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::http::HttpClient;
use super::types::{
    Application, ApplicationFilters, ApplicationStatus, ApplyRequest, Conversation, CreateJobRequest, Job, JobFilters,
    JobUpdate, Message, Notification, ProfileUpdate, SendMessageRequest, StatusUpdate, User,
};
use crate::config::ClientConfig;
use crate::error::{ApiError, ValidationError};
use crate::state::session::SessionStore;
use crate::state::storage::FileTokenStore;

/// Reject ids that would change the shape of the request path.
fn path_segment<'a>(field: &'static str, id: &'a str) -> Result<&'a str, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::required(field).into());
    }
    if id.contains(['/', '?', '#']) {
        return Err(ValidationError::new(field, "must not contain '/', '?' or '#'").into());
    }
    Ok(id)
}

fn job_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/jobs/{}", path_segment("jobId", id)?))
}

fn application_status_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/applications/{}/status", path_segment("applicationId", id)?))
}

fn messages_path(user_id: &str) -> Result<String, ApiError> {
    Ok(format!("/messages/{}", path_segment("userId", user_id)?))
}

fn notification_read_path(id: &str) -> Result<String, ApiError> {
    Ok(format!("/notifications/{}/read", path_segment("notificationId", id)?))
}

fn resume_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct JobBoardApi {
    http: HttpClient,
    session: Arc<SessionStore>,
}

impl JobBoardApi {
    #[must_use]
    pub fn new(http: HttpClient, session: Arc<SessionStore>) -> Self {
        Self { http, session }
    }

    /// Wire the HTTP adapter, a file-backed token store, and a fresh session
    /// store from `config`. The session starts in `Loading`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = HttpClient::new(config)?;
        let storage = Arc::new(FileTokenStore::new(config.token_file.clone()));
        let session = Arc::new(SessionStore::new(Arc::new(http.clone()), storage));
        Ok(Self::new(http, session))
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Build a request carrying the current token, if any.
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, Option<String>) {
        let token = self.session.token();
        (self.http.request(method, path, token.as_deref()), token)
    }

    async fn settle<T>(&self, result: Result<T, ApiError>, token: Option<&str>) -> Result<T, ApiError> {
        match (result, token) {
            (Err(ApiError::Unauthorized), Some(token)) => {
                if self.session.expire(token).await {
                    tracing::warn!("protected call rejected; session expired");
                }
                Err(ApiError::SessionExpired)
            }
            (result, _) => result,
        }
    }

    async fn json<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ApiError> {
        let (req, token) = self.request(method, path);
        let result = self.http.send_json(req).await;
        self.settle(result, token.as_deref()).await
    }

    async fn json_with<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (req, token) = self.request(method, path);
        let result = self.http.send_json(req.json(body)).await;
        self.settle(result, token.as_deref()).await
    }

    async fn empty(&self, req: RequestBuilder, token: Option<String>) -> Result<(), ApiError> {
        let result = self.http.send_empty(req).await;
        self.settle(result, token.as_deref()).await
    }

    // -------------------------------------------------------------------------
    // Jobs
    // -------------------------------------------------------------------------

    /// `GET /jobs` with filters.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn jobs(&self, filters: &JobFilters) -> Result<Vec<Job>, ApiError> {
        let (req, token) = self.request(Method::GET, "/jobs");
        let result = self.http.send_json(req.query(filters)).await;
        self.settle(result, token.as_deref()).await
    }

    /// `GET /jobs/:id`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; any other [`ApiError`] from the exchange.
    pub async fn job(&self, id: &str) -> Result<Job, ApiError> {
        self.json(Method::GET, &job_path(id)?).await
    }

    /// `POST /jobs`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn create_job(&self, job: &CreateJobRequest) -> Result<Job, ApiError> {
        self.json_with(Method::POST, "/jobs", job).await
    }

    /// `PUT /jobs/:id` with only the changed fields.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job, ApiError> {
        self.json_with(Method::PUT, &job_path(id)?, update).await
    }

    /// `DELETE /jobs/:id`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn delete_job(&self, id: &str) -> Result<(), ApiError> {
        let (req, token) = self.request(Method::DELETE, &job_path(id)?);
        self.empty(req, token).await
    }

    // -------------------------------------------------------------------------
    // Applications
    // -------------------------------------------------------------------------

    /// `POST /applications`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn apply(&self, job_id: &str, cover_letter: &str) -> Result<Application, ApiError> {
        let body = ApplyRequest {
            job_id: path_segment("jobId", job_id)?.to_owned(),
            cover_letter: cover_letter.to_owned(),
        };
        self.json_with(Method::POST, "/applications", &body).await
    }

    /// `GET /applications` with filters.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn applications(&self, filters: &ApplicationFilters) -> Result<Vec<Application>, ApiError> {
        let (req, token) = self.request(Method::GET, "/applications");
        let result = self.http.send_json(req.query(filters)).await;
        self.settle(result, token.as_deref()).await
    }

    /// `PUT /applications/:id/status`. The server decides whether the transition is legal.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        self.json_with(Method::PUT, &application_status_path(id)?, &StatusUpdate { status }).await
    }

    // -------------------------------------------------------------------------
    // Profile
    // -------------------------------------------------------------------------

    /// `GET /users/profile`; refreshes the session's user snapshot.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn profile(&self) -> Result<User, ApiError> {
        let (req, token) = self.request(Method::GET, "/users/profile");
        let result = self.http.send_json::<User>(req).await;
        let user = self.settle(result, token.as_deref()).await?;
        if let Some(token) = token {
            self.session.apply_profile(&token, user.clone());
        }
        Ok(user)
    }

    /// `PUT /users/profile`; the response replaces the session's user snapshot.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let (req, token) = self.request(Method::PUT, "/users/profile");
        let result = self.http.send_json::<User>(req.json(update)).await;
        let user = self.settle(result, token.as_deref()).await?;
        if let Some(token) = token {
            self.session.apply_profile(&token, user.clone());
        }
        Ok(user)
    }

    /// `POST /users/resume` as multipart form field `resume`.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read; any [`ApiError`] from the exchange.
    pub async fn upload_resume(&self, path: &Path) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_owned();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(resume_mime(path))?;
        let form = reqwest::multipart::Form::new().part("resume", part);

        let (req, token) = self.request(Method::POST, "/users/resume");
        self.empty(req.multipart(form), token).await
    }

    // -------------------------------------------------------------------------
    // Messaging & notifications
    // -------------------------------------------------------------------------

    /// `GET /messages/conversations`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.json(Method::GET, "/messages/conversations").await
    }

    /// `GET /messages/:userId`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn messages(&self, user_id: &str) -> Result<Vec<Message>, ApiError> {
        self.json(Method::GET, &messages_path(user_id)?).await
    }

    /// `POST /messages`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn send_message(&self, receiver_id: &str, content: &str) -> Result<Message, ApiError> {
        let body = SendMessageRequest {
            receiver_id: path_segment("receiverId", receiver_id)?.to_owned(),
            content: content.to_owned(),
        };
        self.json_with(Method::POST, "/messages", &body).await
    }

    /// `GET /notifications`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.json(Method::GET, "/notifications").await
    }

    /// `PUT /notifications/:id/read`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the exchange.
    pub async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        let (req, token) = self.request(Method::PUT, &notification_read_path(id)?);
        self.empty(req, token).await
    }
}
