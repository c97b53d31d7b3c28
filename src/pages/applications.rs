//! The signed-in user's applications, optionally narrowed by status.

#[cfg(test)]
#[path = "applications_test.rs"]
mod applications_test;

use super::{ViewScope, ViewState};
use crate::net::api::JobBoardApi;
use crate::net::types::{Application, ApplicationFilters, ApplicationStatus};

const STATUS_ORDER: [ApplicationStatus; 5] = [
    ApplicationStatus::Applied,
    ApplicationStatus::Reviewed,
    ApplicationStatus::Interview,
    ApplicationStatus::Offered,
    ApplicationStatus::Rejected,
];

pub struct ApplicationsView {
    api: JobBoardApi,
    scope: ViewScope,
    pub status_filter: Option<ApplicationStatus>,
    pub applications: Vec<Application>,
    pub state: ViewState,
}

impl ApplicationsView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self { api, scope: ViewScope::new(), status_filter: None, applications: Vec::new(), state: ViewState::default() }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self) {
        self.state.begin();
        let filters = ApplicationFilters { status: self.status_filter, ..ApplicationFilters::default() };
        match self.scope.run(self.api.applications(&filters)).await {
            Ok(applications) => {
                self.applications = applications;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("applications", &e);
            }
        }
    }

    /// Count per status in pipeline order; statuses with no entries are skipped.
    #[must_use]
    pub fn counts_by_status(&self) -> Vec<(ApplicationStatus, usize)> {
        STATUS_ORDER
            .iter()
            .map(|status| (*status, self.applications.iter().filter(|a| a.status == *status).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}
