//! End-to-end flows against an in-process fake backend, using the file-backed
//! token store the binary uses.

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use jobboard::config::ClientConfig;
use jobboard::error::{ApiError, AuthError};
use jobboard::net::api::JobBoardApi;
use jobboard::net::types::{CreateJobRequest, ExperienceLevel, JobFilters};
use jobboard::routes::guard::Decision;
use jobboard::state::session::SessionStatus;

const TOKEN: &str = "tok-e2e";

#[derive(Default)]
struct Backend {
    jobs: Vec<Value>,
    /// `(path, Authorization)` for every request.
    seen: Vec<(String, Option<String>)>,
    revoked: bool,
    logouts: usize,
}

type Shared = Arc<Mutex<Backend>>;

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

fn authorized(b: &Backend, headers: &HeaderMap) -> bool {
    !b.revoked && auth_header(headers) == Some(format!("Bearer {TOKEN}"))
}

fn employer() -> Value {
    json!({
        "id": 7, "firstName": "John", "lastName": "Doe", "email": "john@x.com",
        "role": "EMPLOYER", "companyName": "Acme"
    })
}

async fn login(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["email"] == "john@x.com" && body["password"] == "pw" {
        Ok(Json(json!({ "token": TOKEN, "user": employer() })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn logout(State(state): State<Shared>) -> StatusCode {
    state.lock().unwrap().logouts += 1;
    StatusCode::OK
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let mut b = state.lock().unwrap();
    b.seen.push(("/users/profile".into(), auth_header(&headers)));
    if authorized(&b, &headers) { Ok(Json(employer())) } else { Err(StatusCode::UNAUTHORIZED) }
}

async fn list_jobs(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let mut b = state.lock().unwrap();
    b.seen.push(("/jobs".into(), auth_header(&headers)));
    if headers.contains_key(header::AUTHORIZATION) && !authorized(&b, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(Value::Array(b.jobs.clone())))
}

async fn create_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut b = state.lock().unwrap();
    b.seen.push(("/jobs".into(), auth_header(&headers)));
    if !authorized(&b, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let mut job = body;
    job["id"] = json!(b.jobs.len() + 100);
    job["postedDate"] = json!("2026-03-01");
    job["status"] = json!("ACTIVE");
    b.jobs.push(job.clone());
    Ok(Json(job))
}

async fn get_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut b = state.lock().unwrap();
    b.seen.push((format!("/jobs/{id}"), auth_header(&headers)));
    if id == "42" {
        return Ok(Json(json!({ "id": 42, "title": "Seeded", "postedDate": "2026-01-01", "status": "ACTIVE" })));
    }
    b.jobs
        .iter()
        .find(|j| j["id"].to_string() == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn start() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Backend::default()));
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/users/profile", get(profile))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/{id}", get(get_job))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), state)
}

async fn client(base_url: &str, token_file: &Path) -> JobBoardApi {
    let mut config = ClientConfig::with_base_url(base_url);
    config.token_file = token_file.to_path_buf();
    let api = JobBoardApi::from_config(&config).unwrap();
    api.session().restore_session().await;
    api
}

fn stored_token(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&raw).ok()?;
    value["token"].as_str().map(str::to_owned)
}

// =============================================================================
// Flows
// =============================================================================

#[tokio::test]
async fn login_token_is_sent_on_later_requests() {
    let (base, backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let api = client(&base, &dir.path().join("token.json")).await;
    assert_eq!(api.session().status(), SessionStatus::Anonymous);

    let user = api.session().login("john@x.com", "pw").await.unwrap();
    assert_eq!(user.id, "7");
    assert_eq!(api.session().token().as_deref(), Some(TOKEN));

    let job = api.job("42").await.unwrap();
    assert_eq!(job.title, "Seeded");

    let seen = backend.lock().unwrap().seen.clone();
    let (_, auth) = seen.iter().find(|(path, _)| path == "/jobs/42").unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer tok-e2e"));
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization() {
    let (base, backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let api = client(&base, &dir.path().join("token.json")).await;

    api.jobs(&JobFilters::default()).await.unwrap();

    let seen = backend.lock().unwrap().seen.clone();
    assert_eq!(seen, vec![("/jobs".to_owned(), None)]);
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let (base, _backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let api = client(&base, &token_file).await;

    let err = api.session().login("john@x.com", "nope").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(api.session().status(), SessionStatus::Anonymous);
    assert!(!token_file.exists());
}

#[tokio::test]
async fn created_job_round_trips_through_backend() {
    let (base, _backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let api = client(&base, &dir.path().join("token.json")).await;
    api.session().login("john@x.com", "pw").await.unwrap();

    let request = CreateJobRequest {
        title: "Staff Engineer".into(),
        description: "Lead the platform".into(),
        location: "Lisbon".into(),
        remote: false,
        experience_level: ExperienceLevel::Senior,
        salary_min: Some(140_000),
        salary_max: None,
        requirements: vec!["Rust".into(), "Postgres".into(), "Mentoring".into()],
        application_deadline: None,
    };
    let created = api.create_job(&request).await.unwrap();
    let fetched = api.job(&created.id).await.unwrap();

    assert_eq!(fetched.title, "Staff Engineer");
    assert_eq!(fetched.requirements, vec!["Rust", "Postgres", "Mentoring"]);
    assert_eq!(fetched.experience_level, ExperienceLevel::Senior);
    assert_eq!(fetched.salary_min, Some(140_000));
}

#[tokio::test]
async fn login_then_logout_clears_token_file() {
    let (base, backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let api = client(&base, &token_file).await;

    api.session().login("john@x.com", "pw").await.unwrap();
    assert_eq!(stored_token(&token_file).as_deref(), Some(TOKEN));

    api.session().logout().await;

    assert_eq!(api.session().status(), SessionStatus::Anonymous);
    assert_eq!(stored_token(&token_file), None);
    assert_eq!(backend.lock().unwrap().logouts, 1);
}

#[tokio::test]
async fn stored_token_restores_session_on_next_start() {
    let (base, _backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");

    let first = client(&base, &token_file).await;
    first.session().login("john@x.com", "pw").await.unwrap();
    drop(first);

    let second = client(&base, &token_file).await;
    assert_eq!(second.session().status(), SessionStatus::Authenticated);
    assert_eq!(second.session().navigate("/post-job").await, Decision::Allow);
    assert_eq!(second.session().navigate("/dashboard").await, Decision::RedirectToHome);
}

#[tokio::test]
async fn revoked_token_expires_session_on_protected_call() {
    let (base, backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let api = client(&base, &token_file).await;
    api.session().login("john@x.com", "pw").await.unwrap();
    let mut updates = api.session().subscribe();
    updates.mark_unchanged();

    backend.lock().unwrap().revoked = true;
    let err = api.jobs(&JobFilters::default()).await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(api.session().status(), SessionStatus::Anonymous);
    assert_eq!(stored_token(&token_file), None);
    assert!(updates.has_changed().unwrap());
    assert_eq!(api.session().navigate("/post-job").await, Decision::RedirectToLogin);
}

#[tokio::test]
async fn revoked_stored_token_starts_anonymous() {
    let (base, backend) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    std::fs::write(&token_file, json!({ "token": TOKEN }).to_string()).unwrap();
    backend.lock().unwrap().revoked = true;

    let api = client(&base, &token_file).await;

    assert_eq!(api.session().status(), SessionStatus::Anonymous);
    assert_eq!(stored_token(&token_file), None);
}
