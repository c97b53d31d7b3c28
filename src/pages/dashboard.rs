//! Employer dashboard: own postings plus incoming applications.
//!
//! SYSTEM CONTEXT
//! ==============
//! Jobs and applications are fetched concurrently. Each result lands in its
//! own field, so a failed applications fetch still shows the job list.
//! Status changes go to the server first; the view then refetches rather
//! than patching local rows.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use super::{ViewScope, ViewState};
use crate::error::{ApiError, user_message};
use crate::net::api::JobBoardApi;
use crate::net::types::{Application, ApplicationFilters, ApplicationStatus, Job, JobFilters};

/// The backend resolves this to the caller's own employer id.
pub const CURRENT_EMPLOYER: &str = "current";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub active_jobs: usize,
    pub total_applications: usize,
    /// Applications still in `APPLIED`.
    pub awaiting_review: usize,
}

pub struct EmployerDashboardView {
    api: JobBoardApi,
    scope: ViewScope,
    pub jobs: Vec<Job>,
    pub applications: Vec<Application>,
    pub jobs_error: Option<&'static str>,
    pub applications_error: Option<&'static str>,
    pub state: ViewState,
}

impl EmployerDashboardView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            jobs: Vec::new(),
            applications: Vec::new(),
            jobs_error: None,
            applications_error: None,
            state: ViewState::default(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self) {
        self.state.begin();
        let job_filters = JobFilters { employer_id: Some(CURRENT_EMPLOYER.to_owned()), ..JobFilters::default() };
        let app_filters =
            ApplicationFilters { employer_id: Some(CURRENT_EMPLOYER.to_owned()), ..ApplicationFilters::default() };

        let (jobs, applications) = tokio::join!(
            self.scope.run(self.api.jobs(&job_filters)),
            self.scope.run(self.api.applications(&app_filters)),
        );

        if matches!((&jobs, &applications), (Err(ApiError::Cancelled), Err(ApiError::Cancelled))) {
            tracing::debug!("dashboard load abandoned");
            self.state.abandon();
            return;
        }

        match jobs {
            Ok(jobs) => {
                self.jobs = jobs;
                self.jobs_error = None;
            }
            Err(ApiError::Cancelled) => {}
            Err(e) => {
                self.state.fail("dashboard jobs", &e);
                self.jobs_error = Some(user_message(&e));
            }
        }
        match applications {
            Ok(applications) => {
                self.applications = applications;
                self.applications_error = None;
            }
            Err(ApiError::Cancelled) => {}
            Err(e) => {
                self.state.fail("dashboard applications", &e);
                self.applications_error = Some(user_message(&e));
            }
        }
        self.state.finish();
    }

    #[must_use]
    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            active_jobs: self.jobs.iter().filter(|j| j.status.eq_ignore_ascii_case("ACTIVE")).count(),
            total_applications: self.applications.len(),
            awaiting_review: self.applications.iter().filter(|a| a.status == ApplicationStatus::Applied).count(),
        }
    }

    /// Applications for one of the employer's jobs.
    #[must_use]
    pub fn applications_for(&self, job_id: &str) -> Vec<&Application> {
        self.applications.iter().filter(|a| a.job_id == job_id).collect()
    }

    /// Ask the server to move an application, then refetch everything.
    pub async fn update_status(&mut self, application_id: &str, status: ApplicationStatus) {
        let updated = self.scope.run(self.api.update_application_status(application_id, status)).await;
        match updated {
            Ok(updated) => {
                tracing::info!(application_id, status = ?updated.status, "application status updated");
                self.load().await;
            }
            Err(e) => {
                self.state.fail("update application status", &e);
            }
        }
    }
}
