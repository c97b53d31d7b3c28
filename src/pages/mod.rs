//! Headless domain views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each view owns a small state struct plus a [`ViewScope`]. Views call the
//! protected API, fold failures into [`ViewState`], and never mutate the
//! session themselves; a 401 surfaces here as `SessionExpired` after the API
//! layer has already expired the session.
//!
//! DESIGN
//! ======
//! Cancellation: closing (or dropping) the scope abandons in-flight calls.
//! An abandoned call resolves to `ApiError::Cancelled` and the view leaves
//! its data and error fields as they were.

pub mod applications;
pub mod create_job;
pub mod dashboard;
pub mod job_detail;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod profile;


use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, user_message};
use crate::routes::LOGIN;

/// Cancellation handle owned by one view instance.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon every call currently running in this scope, and any started later.
    pub fn close(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A handle that closes this scope from elsewhere (e.g. a navigation task).
    #[must_use]
    pub fn closer(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `fut` unless the scope closes first.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the scope closes before `fut` completes, otherwise
    /// whatever `fut` returns.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ApiError::Cancelled),
            result = fut => result,
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Loading/error/redirect fields every view carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub loading: bool,
    /// Generic user-facing message; details go to the log.
    pub error: Option<&'static str>,
    /// Set when the view should be left, e.g. `/login` after session expiry.
    pub redirect: Option<&'static str>,
    /// `(loading, error)` as they were before the call in flight began.
    before: Option<(bool, Option<&'static str>)>,
}

impl ViewState {
    pub(crate) fn begin(&mut self) {
        self.before = Some((self.loading, self.error));
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn finish(&mut self) {
        self.before = None;
        self.loading = false;
    }

    /// Put back what `begin` changed. Used when the call in flight was
    /// cancelled and has no outcome to show.
    pub(crate) fn abandon(&mut self) {
        if let Some((loading, error)) = self.before.take() {
            self.loading = loading;
            self.error = error;
        }
    }

    /// Record `err` against this view. Returns `false` for a cancelled call,
    /// in which case the state is as it was before `begin`.
    pub(crate) fn fail(&mut self, context: &'static str, err: &ApiError) -> bool {
        match err {
            ApiError::Cancelled => {
                tracing::debug!(context, "view call abandoned");
                self.abandon();
                return false;
            }
            ApiError::SessionExpired => {
                tracing::info!(context, "session expired; redirecting to login");
                self.redirect = Some(LOGIN);
            }
            other => tracing::warn!(context, error = %other, "view call failed"),
        }
        self.before = None;
        self.loading = false;
        self.error = Some(user_message(err));
        true
    }
}
