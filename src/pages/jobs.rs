//! Job list view with search and filter controls.

#[cfg(test)]
#[path = "jobs_test.rs"]
mod jobs_test;

use super::create_job::parse_salary;
use super::{ViewScope, ViewState};
use crate::error::ValidationError;
use crate::net::api::JobBoardApi;
use crate::net::types::{ExperienceLevel, Job, JobFilters};
use crate::util::format::format_salary;

/// One rendered row of the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub remote: bool,
    pub salary: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            company: job.company_name.clone().unwrap_or_default(),
            location: job.location.clone(),
            remote: job.remote,
            salary: format_salary(job.salary_min, job.salary_max),
        }
    }
}

pub struct JobListView {
    api: JobBoardApi,
    scope: ViewScope,
    pub filters: JobFilters,
    pub jobs: Vec<Job>,
    pub state: ViewState,
}

impl JobListView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self { api, scope: ViewScope::new(), filters: JobFilters::default(), jobs: Vec::new(), state: ViewState::default() }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Set the free-text search; blank clears it.
    pub fn set_search(&mut self, search: &str) {
        let search = search.trim();
        self.filters.search = (!search.is_empty()).then(|| search.to_owned());
    }

    pub fn set_location(&mut self, location: &str) {
        let location = location.trim();
        self.filters.location = (!location.is_empty()).then(|| location.to_owned());
    }

    pub fn set_remote(&mut self, remote: Option<bool>) {
        self.filters.remote = remote;
    }

    pub fn set_experience_level(&mut self, level: Option<ExperienceLevel>) {
        self.filters.experience_level = level;
    }

    /// Set the minimum salary from user input; blank clears it. An
    /// unparsable value leaves the filter as it was.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] on `salaryMin` when the input is not a whole number.
    pub fn set_salary_min(&mut self, raw: &str) -> Result<(), ValidationError> {
        self.filters.salary_min = parse_salary("salaryMin", raw)?;
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters = JobFilters::default();
    }

    /// Fetch jobs matching the current filters.
    pub async fn load(&mut self) {
        self.state.begin();
        match self.scope.run(self.api.jobs(&self.filters)).await {
            Ok(jobs) => {
                self.jobs = jobs;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("job list", &e);
            }
        }
    }

    #[must_use]
    pub fn rows(&self) -> Vec<JobRow> {
        self.jobs.iter().map(JobRow::from).collect()
    }
}
