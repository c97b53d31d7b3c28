//! Session store: the client's single source of truth for who is logged in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views read the current [`Session`] (or subscribe to changes), the route
//! guard decides reachability from it, and the protected API reads the
//! bearer token from it. Only this module mutates the session.
//!
//! DESIGN
//! ======
//! The session is a three-state machine:
//!
//! ```text
//! Loading ──► Authenticated ◄──► Anonymous
//!    └──────────────────────────────▲
//! ```
//!
//! Mutations happen under a short critical section that never spans a
//! network call. Every applied change bumps a monotonic epoch; login and
//! register remember the epoch they started from and refuse to apply a
//! result once it has moved, so a logout issued during a slow login wins.
//! Subscribers are notified through a `tokio::sync::watch` channel.
//!
//! Changes that also write the token store (establish, logout, expire) take
//! an async storage turn first and keep it until both sides are written.
//! Two overlapping logins therefore cannot interleave their writes, and the
//! stored token always matches the session that won.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, watch};

use crate::error::{ApiError, AuthError, ValidationError};
use crate::net::types::{AuthResponse, LoginRequest, RegisterRequest, Role, User};
use crate::routes::guard::{self, Decision};
use crate::state::backend::AuthBackend;
use crate::state::storage::TokenStore;

// =============================================================================
// SESSION VALUE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Anonymous,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Anonymous => "anonymous",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// A session whose startup restore has completed. The route guard only
/// accepts this, so no route decision can be made while loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedSession {
    Anonymous,
    Authenticated(Role),
}

/// Snapshot of the current session.
///
/// Fields are private so the invariant holds for every value in circulation:
/// token present ⇔ user present ⇔ status is `Authenticated`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    status: SessionStatus,
    user: Option<User>,
    token: Option<String>,
}

impl Session {
    #[must_use]
    pub fn loading() -> Self {
        Self { status: SessionStatus::Loading, user: None, token: None }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { status: SessionStatus::Anonymous, user: None, token: None }
    }

    #[must_use]
    pub fn authenticated(user: User, token: String) -> Self {
        Self { status: SessionStatus::Authenticated, user: Some(user), token: Some(token) }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// `None` while loading.
    #[must_use]
    pub fn resolved(&self) -> Option<ResolvedSession> {
        match (self.status, self.role()) {
            (SessionStatus::Loading, _) => None,
            (SessionStatus::Authenticated, Some(role)) => Some(ResolvedSession::Authenticated(role)),
            _ => Some(ResolvedSession::Anonymous),
        }
    }
}

fn transition_allowed(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::{Anonymous, Authenticated, Loading};
    matches!(
        (from, to),
        (Loading, Authenticated | Anonymous) | (Authenticated, Anonymous) | (Anonymous, Authenticated)
    )
}

// =============================================================================
// VALIDATION
// =============================================================================

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Local checks for the registration form. Runs before any network call.
///
/// # Errors
///
/// Returns the first failing field: `firstName`, `lastName`, `email`,
/// `password`, or `companyName` (employers only).
pub fn validate_registration(profile: &RegisterRequest) -> Result<(), ValidationError> {
    require("firstName", &profile.first_name)?;
    require("lastName", &profile.last_name)?;
    require("email", &profile.email)?;
    if !profile.email.contains('@') {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }
    require("password", &profile.password)?;
    if profile.role == Role::Employer {
        require("companyName", profile.company_name.as_deref().unwrap_or_default())?;
    }
    Ok(())
}

fn normalized_registration(profile: RegisterRequest) -> RegisterRequest {
    let company_name = match profile.role {
        Role::Employer => profile.company_name.map(|c| c.trim().to_owned()),
        Role::JobSeeker => None,
    };
    RegisterRequest {
        first_name: profile.first_name.trim().to_owned(),
        last_name: profile.last_name.trim().to_owned(),
        email: profile.email.trim().to_owned(),
        password: profile.password,
        role: profile.role,
        company_name,
    }
}

// =============================================================================
// STORE
// =============================================================================

struct Inner {
    session: Session,
    epoch: u64,
}

/// Process-wide owner of the [`Session`]. Share it behind an `Arc`.
pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    storage: Arc<dyn TokenStore>,
    inner: Mutex<Inner>,
    tx: watch::Sender<Session>,
    storage_turn: AsyncMutex<()>,
}

impl SessionStore {
    /// A store in the `Loading` state. Call [`SessionStore::restore_session`]
    /// once before making route decisions.
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, storage: Arc<dyn TokenStore>) -> Self {
        Self {
            backend,
            storage,
            inner: Mutex::new(Inner { session: Session::loading(), epoch: 0 }),
            tx: watch::Sender::new(Session::loading()),
            storage_turn: AsyncMutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock().session.status
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock().session.token.clone()
    }

    /// Receive every published session snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Resolve once the session has left `Loading`.
    pub async fn wait_ready(&self) -> Session {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|s| s.status.is_terminal()).await {
            Ok(session) => session.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Decide reachability of `path`, waiting for restore to finish first.
    pub async fn navigate(&self, path: &str) -> Decision {
        let session = self.wait_ready().await;
        guard::decide_for_session(&session, path).unwrap_or(Decision::RedirectToLogin)
    }

    /// Apply `next` if the epoch still matches `expected` (when given) and the
    /// transition is legal. Publishes to subscribers on success.
    fn apply(&self, expected: Option<u64>, next: Session) -> Result<(), AuthError> {
        let mut inner = self.lock();
        if expected.is_some_and(|epoch| epoch != inner.epoch) {
            return Err(AuthError::Superseded);
        }
        let from = inner.session.status;
        if !transition_allowed(from, next.status) {
            return Err(AuthError::InvalidState(from.as_str()));
        }
        tracing::info!(from = from.as_str(), to = next.status.as_str(), "session transition");
        inner.epoch += 1;
        inner.session = next.clone();
        self.tx.send_replace(next);
        Ok(())
    }

    /// Epoch to hand to `apply`, provided the session is anonymous.
    fn begin_credentials_exchange(&self) -> Result<u64, AuthError> {
        let inner = self.lock();
        match inner.session.status {
            SessionStatus::Anonymous => Ok(inner.epoch),
            other => Err(AuthError::InvalidState(other.as_str())),
        }
    }

    // -------------------------------------------------------------------------
    // Startup
    // -------------------------------------------------------------------------

    /// Restore a persisted session. Always leaves the store in a terminal
    /// status; calling it again after that is a no-op.
    pub async fn restore_session(&self) -> SessionStatus {
        let epoch = {
            let inner = self.lock();
            if inner.session.status.is_terminal() {
                return inner.session.status;
            }
            inner.epoch
        };

        let stored = self.storage.load().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "token storage unreadable; starting anonymous");
            None
        });

        let next = match stored {
            None => Session::anonymous(),
            Some(token) => match self.backend.fetch_profile(&token).await {
                Ok(user) => Session::authenticated(user, token),
                Err(ApiError::Unauthorized) => {
                    tracing::info!("stored token rejected; session expired");
                    let _turn = self.storage_turn.lock().await;
                    self.clear_storage().await;
                    Session::anonymous()
                }
                Err(e) => {
                    // Token is kept so a later start can try again.
                    tracing::warn!(error = %e, "profile check failed; starting anonymous");
                    Session::anonymous()
                }
            },
        };

        if let Err(e) = self.apply(Some(epoch), next) {
            tracing::debug!(error = %e, "restore result discarded");
        }
        self.status()
    }

    // -------------------------------------------------------------------------
    // Credentials
    // -------------------------------------------------------------------------

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` or `NetworkFailure` from the exchange;
    /// `InvalidState` unless anonymous; `Superseded` if the session changed
    /// while the request was in flight. The session is unchanged on error.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        require("email", email)?;
        require("password", password)?;
        let epoch = self.begin_credentials_exchange()?;

        let request = LoginRequest { email: email.trim().to_owned(), password: password.to_owned() };
        let response = self.backend.login(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "login failed");
            AuthError::from_credentials_exchange(e)
        })?;
        self.establish(epoch, response).await
    }

    /// Create an account and log in as it.
    ///
    /// # Errors
    ///
    /// `Validation` before any request is made; otherwise as [`SessionStore::login`].
    pub async fn register(&self, profile: RegisterRequest) -> Result<User, AuthError> {
        validate_registration(&profile)?;
        let epoch = self.begin_credentials_exchange()?;

        let request = normalized_registration(profile);
        let response = self.backend.register(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "registration failed");
            AuthError::from_credentials_exchange(e)
        })?;
        self.establish(epoch, response).await
    }

    async fn establish(&self, epoch: u64, response: AuthResponse) -> Result<User, AuthError> {
        let _turn = self.storage_turn.lock().await;
        if self.lock().epoch != epoch {
            return Err(AuthError::Superseded);
        }
        self.storage.save(&response.token).await.map_err(|e| AuthError::Storage(e.to_string()))?;

        let user = response.user;
        if let Err(e) = self.apply(Some(epoch), Session::authenticated(user.clone(), response.token)) {
            // A logout landed between the token write and now.
            self.clear_storage().await;
            return Err(e);
        }
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "session authenticated");
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// End the session locally, then tell the backend. Never fails.
    pub async fn logout(&self) {
        let turn = self.storage_turn.lock().await;
        let previous_token = {
            let mut inner = self.lock();
            let token = inner.session.token.take();
            // Bumped even when already anonymous so a pending login is discarded.
            inner.epoch += 1;
            if inner.session.status != SessionStatus::Anonymous {
                tracing::info!(from = inner.session.status.as_str(), to = "anonymous", "session transition");
                inner.session = Session::anonymous();
                self.tx.send_replace(Session::anonymous());
            }
            token
        };

        self.clear_storage().await;
        drop(turn);
        if let Some(token) = previous_token {
            if let Err(e) = self.backend.logout(&token).await {
                tracing::warn!(error = %e, "backend logout failed");
            }
        }
    }

    /// Drop the session because the backend rejected `rejected_token`.
    /// Ignored if the session has since moved on to another token.
    pub async fn expire(&self, rejected_token: &str) -> bool {
        let _turn = self.storage_turn.lock().await;
        let expected = {
            let inner = self.lock();
            if inner.session.token.as_deref() != Some(rejected_token) {
                return false;
            }
            inner.epoch
        };
        if self.apply(Some(expected), Session::anonymous()).is_err() {
            return false;
        }
        tracing::info!("session expired");
        self.clear_storage().await;
        true
    }

    /// Callers hold the storage turn.
    async fn clear_storage(&self) {
        if let Err(e) = self.storage.clear().await {
            tracing::warn!(error = %e, "failed to clear stored token");
        }
    }

    // -------------------------------------------------------------------------
    // Profile
    // -------------------------------------------------------------------------

    /// Re-fetch the current user.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless authenticated; `SessionExpired` (after expiring
    /// the session) on a 401; `NetworkFailure`/`Server` otherwise.
    pub async fn refresh_profile(&self) -> Result<User, AuthError> {
        let Some(token) = self.token() else {
            return Err(AuthError::InvalidState(self.status().as_str()));
        };
        match self.backend.fetch_profile(&token).await {
            Ok(user) => {
                self.apply_profile(&token, user.clone());
                Ok(user)
            }
            Err(ApiError::Unauthorized) => {
                self.expire(&token).await;
                Err(AuthError::SessionExpired)
            }
            Err(ApiError::Network(msg)) => Err(AuthError::NetworkFailure(msg)),
            Err(e) => Err(AuthError::Server(e.to_string())),
        }
    }

    /// Replace the user snapshot of the session that owns `token`.
    pub fn apply_profile(&self, token: &str, user: User) -> bool {
        let mut inner = self.lock();
        if inner.session.token.as_deref() != Some(token) {
            return false;
        }
        inner.session.user = Some(user);
        self.tx.send_replace(inner.session.clone());
        true
    }
}
