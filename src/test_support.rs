//! In-process fake backend for view and API tests.
//!
//! Serves the REST contract under `/api` on an ephemeral port and records the
//! `Authorization` header of every request it sees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::net::api::JobBoardApi;
use crate::net::http::HttpClient;
use crate::state::session::SessionStore;
use crate::state::storage::MemoryTokenStore;

pub(crate) const TOKEN: &str = "tok-1";

pub(crate) struct FakeState {
    pub token: String,
    pub user: Value,
    pub jobs: Vec<Value>,
    pub applications: Vec<Value>,
    pub messages: Vec<Value>,
    pub conversations: Vec<Value>,
    pub notifications: Vec<Value>,
    /// Answer every authenticated call with 401.
    pub reject_tokens: bool,
    /// Answer `GET /applications` with 500.
    pub fail_applications: bool,
    /// Hold `GET /jobs` for this long before answering.
    pub jobs_delay: Option<Duration>,
    /// `(path, Authorization header)` per request, in arrival order.
    pub auth_headers: Vec<(String, Option<String>)>,
    pub resume_uploads: Vec<usize>,
    next_id: u64,
}

impl FakeState {
    fn seeded() -> Self {
        Self {
            token: TOKEN.to_owned(),
            user: json!({
                "id": "u1", "firstName": "John", "lastName": "Doe",
                "email": "john@x.com", "role": "JOB_SEEKER"
            }),
            jobs: vec![json!({
                "id": "42", "title": "Rust Engineer", "description": "Build services",
                "location": "Berlin", "remote": true, "experienceLevel": "SENIOR",
                "salaryMin": 90000, "salaryMax": 120000,
                "requirements": ["Rust", "Tokio"], "postedDate": "2026-01-05",
                "status": "ACTIVE", "companyName": "Acme", "employerId": "e1"
            })],
            applications: vec![json!({
                "id": "a1", "jobId": "42", "candidateId": "u1",
                "coverLetter": "Hello", "appliedDate": "2026-01-06", "status": "APPLIED"
            })],
            messages: vec![json!({
                "id": "m1", "senderId": "e1", "receiverId": "u1",
                "content": "Thanks for applying", "timestamp": "2026-01-07T10:00:00Z"
            })],
            conversations: vec![json!({ "userId": "e1", "name": "Jane Roe", "lastMessage": "Thanks for applying" })],
            notifications: vec![
                json!({ "id": "n1", "message": "Application reviewed", "read": false }),
                json!({ "id": "n2", "message": "New message", "read": true }),
            ],
            reject_tokens: false,
            fail_applications: false,
            jobs_delay: None,
            auth_headers: Vec::new(),
            resume_uploads: Vec::new(),
            next_id: 100,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn record(&mut self, path: &str, headers: &HeaderMap) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.auth_headers.push((path.to_owned(), auth));
    }

    fn authorize(&mut self, path: &str, headers: &HeaderMap) -> Result<(), StatusCode> {
        self.record(path, headers);
        let expected = format!("Bearer {}", self.token);
        let presented = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        if self.reject_tokens || presented != Some(expected.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(())
    }

    fn user_id(&self) -> String {
        self.user["id"].as_str().unwrap_or_default().to_owned()
    }
}

type Shared = Arc<Mutex<FakeState>>;
type JsonResult = Result<Json<Value>, StatusCode>;

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct FakeBackend {
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    pub(crate) async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::seeded()));
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/logout", post(logout))
            .route("/api/users/profile", get(profile).put(update_profile))
            .route("/api/users/resume", post(upload_resume))
            .route("/api/jobs", get(list_jobs).post(create_job))
            .route("/api/jobs/{id}", get(get_job).put(update_job).delete(delete_job))
            .route("/api/applications", get(list_applications).post(apply))
            .route("/api/applications/{id}/status", put(update_application_status))
            .route("/api/messages", post(send_message))
            .route("/api/messages/conversations", get(conversations))
            .route("/api/messages/{user_id}", get(thread))
            .route("/api/notifications", get(notifications))
            .route("/api/notifications/{id}/read", put(mark_read))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url: format!("http://{addr}/api"), state }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    pub(crate) fn set_role(&self, role: &str) {
        self.with(|s| {
            s.user["role"] = json!(role);
            if role == "EMPLOYER" {
                s.user["id"] = json!("e1");
                s.user["companyName"] = json!("Acme");
            }
        });
    }

    pub(crate) fn http(&self) -> HttpClient {
        HttpClient::new(&ClientConfig::with_base_url(&self.base_url)).unwrap()
    }

    /// API client whose session has been restored from `token`.
    pub(crate) async fn api(&self, token: Option<&str>) -> JobBoardApi {
        let storage = match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        let http = self.http();
        let session = Arc::new(SessionStore::new(Arc::new(http.clone()), Arc::new(storage)));
        session.restore_session().await;
        JobBoardApi::new(http, session)
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> JsonResult {
    let s = lock(&state);
    if body["email"] == s.user["email"] && body["password"] == "pw" {
        Ok(Json(json!({ "token": s.token, "user": s.user })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> JsonResult {
    let mut s = lock(&state);
    let mut user = body;
    if let Some(obj) = user.as_object_mut() {
        obj.remove("password");
        obj.insert("id".into(), json!("u-new"));
    }
    s.user = user.clone();
    Ok(Json(json!({ "token": s.token, "user": user })))
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> StatusCode {
    lock(&state).record("/auth/logout", &headers);
    StatusCode::NO_CONTENT
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/users/profile", &headers)?;
    Ok(Json(s.user.clone()))
}

async fn update_profile(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/users/profile", &headers)?;
    if let (Some(user), Some(changes)) = (s.user.as_object_mut(), body.as_object()) {
        for (k, v) in changes {
            user.insert(k.clone(), v.clone());
        }
    }
    Ok(Json(s.user.clone()))
}

async fn upload_resume(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let mut s = lock(&state);
    if let Err(code) = s.authorize("/users/resume", &headers) {
        return code;
    }
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let has_field = String::from_utf8_lossy(&body).contains("name=\"resume\"");
    if !is_multipart || !has_field {
        return StatusCode::BAD_REQUEST;
    }
    s.resume_uploads.push(body.len());
    StatusCode::NO_CONTENT
}

async fn list_jobs(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> JsonResult {
    let delay = {
        let mut s = lock(&state);
        s.record("/jobs", &headers);
        s.jobs_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let s = lock(&state);
    let search = query.get("search").map(|q| q.to_lowercase());
    let remote = query.get("remote").map(|r| r == "true");
    let salary_min = query.get("salaryMin").and_then(|m| m.parse::<u64>().ok());
    let employer = query.get("employerId").map(|e| if e == "current" { s.user_id() } else { e.clone() });
    let jobs: Vec<Value> = s
        .jobs
        .iter()
        .filter(|j| {
            search
                .as_ref()
                .is_none_or(|q| j["title"].as_str().unwrap_or_default().to_lowercase().contains(q))
        })
        .filter(|j| remote.is_none_or(|r| j["remote"].as_bool() == Some(r)))
        .filter(|j| salary_min.is_none_or(|m| j["salaryMax"].as_u64().is_some_and(|max| max >= m)))
        .filter(|j| employer.as_ref().is_none_or(|e| j["employerId"].as_str() == Some(e.as_str())))
        .cloned()
        .collect();
    Ok(Json(Value::Array(jobs)))
}

async fn get_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> JsonResult {
    let mut s = lock(&state);
    s.record(&format!("/jobs/{id}"), &headers);
    s.jobs.iter().find(|j| j["id"] == id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_job(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/jobs", &headers)?;
    let id = s.next_id("j");
    let employer_id = s.user_id();
    let mut job = body;
    if let Some(obj) = job.as_object_mut() {
        obj.insert("id".into(), json!(id));
        obj.insert("postedDate".into(), json!("2026-02-01"));
        obj.insert("status".into(), json!("ACTIVE"));
        obj.insert("employerId".into(), json!(employer_id));
    }
    s.jobs.push(job.clone());
    Ok(Json(job))
}

async fn update_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> JsonResult {
    let mut s = lock(&state);
    s.authorize(&format!("/jobs/{id}"), &headers)?;
    let job = s.jobs.iter_mut().find(|j| j["id"] == id).ok_or(StatusCode::NOT_FOUND)?;
    if let (Some(job), Some(changes)) = (job.as_object_mut(), body.as_object()) {
        for (k, v) in changes {
            job.insert(k.clone(), v.clone());
        }
    }
    Ok(Json(job.clone()))
}

async fn delete_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> StatusCode {
    let mut s = lock(&state);
    if let Err(code) = s.authorize(&format!("/jobs/{id}"), &headers) {
        return code;
    }
    let before = s.jobs.len();
    s.jobs.retain(|j| j["id"] != id);
    if s.jobs.len() == before { StatusCode::NOT_FOUND } else { StatusCode::NO_CONTENT }
}

async fn list_applications(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/applications", &headers)?;
    if s.fail_applications {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let job_id = query.get("jobId");
    let apps: Vec<Value> = s
        .applications
        .iter()
        .filter(|a| job_id.is_none_or(|id| a["jobId"] == id.as_str()))
        .cloned()
        .collect();
    Ok(Json(Value::Array(apps)))
}

async fn apply(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/applications", &headers)?;
    let id = s.next_id("a");
    let app = json!({
        "id": id, "jobId": body["jobId"], "candidateId": s.user_id(),
        "coverLetter": body["coverLetter"], "appliedDate": "2026-02-02", "status": "APPLIED"
    });
    s.applications.push(app.clone());
    Ok(Json(app))
}

async fn update_application_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> JsonResult {
    let mut s = lock(&state);
    s.authorize(&format!("/applications/{id}/status"), &headers)?;
    let app = s.applications.iter_mut().find(|a| a["id"] == id).ok_or(StatusCode::NOT_FOUND)?;
    app["status"] = body["status"].clone();
    Ok(Json(app.clone()))
}

async fn conversations(State(state): State<Shared>, headers: HeaderMap) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/messages/conversations", &headers)?;
    Ok(Json(Value::Array(s.conversations.clone())))
}

async fn thread(State(state): State<Shared>, headers: HeaderMap, Path(user_id): Path<String>) -> JsonResult {
    let mut s = lock(&state);
    s.authorize(&format!("/messages/{user_id}"), &headers)?;
    let msgs: Vec<Value> = s
        .messages
        .iter()
        .filter(|m| m["senderId"] == user_id.as_str() || m["receiverId"] == user_id.as_str())
        .cloned()
        .collect();
    Ok(Json(Value::Array(msgs)))
}

async fn send_message(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/messages", &headers)?;
    let id = s.next_id("m");
    let msg = json!({
        "id": id, "senderId": s.user_id(), "receiverId": body["receiverId"],
        "content": body["content"], "timestamp": "2026-02-03T09:00:00Z"
    });
    s.messages.push(msg.clone());
    Ok(Json(msg))
}

async fn notifications(State(state): State<Shared>, headers: HeaderMap) -> JsonResult {
    let mut s = lock(&state);
    s.authorize("/notifications", &headers)?;
    Ok(Json(Value::Array(s.notifications.clone())))
}

async fn mark_read(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> StatusCode {
    let mut s = lock(&state);
    if let Err(code) = s.authorize(&format!("/notifications/{id}/read"), &headers) {
        return code;
    }
    match s.notifications.iter_mut().find(|n| n["id"] == id) {
        Some(n) => {
            n["read"] = json!(true);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}
