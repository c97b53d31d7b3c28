//! Create-job form for employers.
//!
//! DESIGN
//! ======
//! [`JobForm`] is plain data plus validation, so the same rules back the
//! interactive view and the CLI. Requirements keep the order they were
//! added in; blanks and duplicates are dropped on entry.

#[cfg(test)]
#[path = "create_job_test.rs"]
mod create_job_test;

use super::{ViewScope, ViewState};
use crate::error::{ApiError, ValidationError};
use crate::net::api::JobBoardApi;
use crate::net::types::{CreateJobRequest, ExperienceLevel, Job};
use crate::routes::EMPLOYER_DASHBOARD;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub remote: bool,
    pub experience_level: ExperienceLevel,
    /// Raw text as typed; parsed on submit.
    pub salary_min: String,
    pub salary_max: String,
    pub application_deadline: String,
    requirements: Vec<String>,
}

impl JobForm {
    /// Add a trimmed requirement. Returns `false` for blanks and duplicates.
    pub fn add_requirement(&mut self, raw: &str) -> bool {
        let requirement = raw.trim();
        if requirement.is_empty() || self.requirements.iter().any(|r| r == requirement) {
            return false;
        }
        self.requirements.push(requirement.to_owned());
        true
    }

    pub fn remove_requirement(&mut self, requirement: &str) -> bool {
        let before = self.requirements.len();
        self.requirements.retain(|r| r != requirement);
        self.requirements.len() != before
    }

    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Validate and build the request body.
    ///
    /// # Errors
    ///
    /// The first field that fails validation.
    pub fn to_request(&self) -> Result<CreateJobRequest, ValidationError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let location = required("location", &self.location)?;
        let (salary_min, salary_max) = salary_range(&self.salary_min, &self.salary_max)?;
        let deadline = self.application_deadline.trim();

        Ok(CreateJobRequest {
            title,
            description,
            location,
            remote: self.remote,
            experience_level: self.experience_level,
            salary_min,
            salary_max,
            requirements: self.requirements.clone(),
            application_deadline: (!deadline.is_empty()).then(|| deadline.to_owned()),
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_owned())
}

/// Blank means unset.
/// Parse a salary input. Blank means unset; `,` separators are accepted.
///
/// # Errors
///
/// Returns a [`ValidationError`] on `field` when the input is not a whole number.
pub fn parse_salary(field: &'static str, raw: &str) -> Result<Option<u64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.replace(',', "")
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ValidationError::new(field, "must be a whole number"))
}

/// Parse both salary bounds and check that they are in order.
///
/// # Errors
///
/// Returns a [`ValidationError`] for an unparsable bound or a maximum below the minimum.
pub fn salary_range(min: &str, max: &str) -> Result<(Option<u64>, Option<u64>), ValidationError> {
    let min = parse_salary("salaryMin", min)?;
    let max = parse_salary("salaryMax", max)?;
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(ValidationError::new("salaryMax", "must not be less than the minimum salary"));
        }
    }
    Ok((min, max))
}

pub struct CreateJobView {
    api: JobBoardApi,
    scope: ViewScope,
    pub form: JobForm,
    /// Field that failed validation on the last submit.
    pub invalid: Option<ValidationError>,
    pub created: Option<Job>,
    pub state: ViewState,
}

impl CreateJobView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            form: JobForm::default(),
            invalid: None,
            created: None,
            state: ViewState::default(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Validate, post, and on success point the view at the employer dashboard.
    pub async fn submit(&mut self) {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(invalid) => {
                self.state.fail("create job", &ApiError::Validation(invalid.clone()));
                self.invalid = Some(invalid);
                return;
            }
        };
        self.invalid = None;

        self.state.begin();
        match self.scope.run(self.api.create_job(&request)).await {
            Ok(job) => {
                tracing::info!(job_id = %job.id, "job created");
                self.created = Some(job);
                self.form = JobForm::default();
                self.state.finish();
                self.state.redirect = Some(EMPLOYER_DASHBOARD);
            }
            Err(e) => {
                self.state.fail("create job", &e);
            }
        }
    }
}
