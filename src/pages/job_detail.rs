//! Job detail view and the apply flow.
//!
//! Only an authenticated job seeker may apply. Anyone else sees the job but
//! the apply action is refused locally without a network call.

#[cfg(test)]
#[path = "job_detail_test.rs"]
mod job_detail_test;

use super::{ViewScope, ViewState};
use crate::error::ApiError;
use crate::net::api::JobBoardApi;
use crate::net::types::{Application, Job, Role};
use crate::routes::LOGIN;
use crate::util::format::format_salary;

/// Why the apply action is unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyBlocked {
    NotLoggedIn,
    NotJobSeeker,
    NoJob,
}

pub struct JobDetailView {
    api: JobBoardApi,
    scope: ViewScope,
    pub job_id: String,
    pub job: Option<Job>,
    pub not_found: bool,
    pub cover_letter: String,
    pub application: Option<Application>,
    pub state: ViewState,
}

impl JobDetailView {
    #[must_use]
    pub fn new(api: JobBoardApi, job_id: &str) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            job_id: job_id.to_owned(),
            job: None,
            not_found: false,
            cover_letter: String::new(),
            application: None,
            state: ViewState::default(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self) {
        self.state.begin();
        match self.scope.run(self.api.job(&self.job_id)).await {
            Ok(job) => {
                self.job = Some(job);
                self.not_found = false;
                self.state.finish();
            }
            Err(ApiError::NotFound) => {
                self.job = None;
                self.not_found = true;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("job detail", &e);
            }
        }
    }

    #[must_use]
    pub fn salary(&self) -> Option<String> {
        self.job.as_ref().map(|j| format_salary(j.salary_min, j.salary_max))
    }

    /// Whether the current session may apply to the loaded job.
    ///
    /// # Errors
    ///
    /// The reason the action is unavailable.
    pub fn can_apply(&self) -> Result<(), ApplyBlocked> {
        if self.job.is_none() {
            return Err(ApplyBlocked::NoJob);
        }
        match self.api.session().snapshot().role() {
            None => Err(ApplyBlocked::NotLoggedIn),
            Some(Role::Employer) => Err(ApplyBlocked::NotJobSeeker),
            Some(Role::JobSeeker) => Ok(()),
        }
    }

    /// Submit an application with the current cover letter.
    pub async fn apply(&mut self) {
        match self.can_apply() {
            Ok(()) => {}
            Err(ApplyBlocked::NotLoggedIn) => {
                self.state.redirect = Some(LOGIN);
                return;
            }
            Err(ApplyBlocked::NotJobSeeker) => {
                self.state.error = Some("Only job seekers can apply.");
                return;
            }
            Err(ApplyBlocked::NoJob) => return,
        }

        self.state.begin();
        let submitted = self.scope.run(self.api.apply(&self.job_id, &self.cover_letter)).await;
        match submitted {
            Ok(application) => {
                tracing::info!(job_id = %self.job_id, application_id = %application.id, "application submitted");
                self.application = Some(application);
                self.cover_letter.clear();
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("apply", &e);
            }
        }
    }
}
