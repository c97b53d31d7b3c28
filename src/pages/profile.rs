//! Profile view: show and edit the signed-in user, upload a resume.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use std::path::Path;

use super::{ViewScope, ViewState};
use crate::net::api::JobBoardApi;
use crate::net::types::{ProfileUpdate, Role, User};

pub struct ProfileView {
    api: JobBoardApi,
    scope: ViewScope,
    pub user: Option<User>,
    pub saved: bool,
    pub resume_uploaded: bool,
    pub state: ViewState,
}

impl ProfileView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self { api, scope: ViewScope::new(), user: None, saved: false, resume_uploaded: false, state: ViewState::default() }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self) {
        self.state.begin();
        match self.scope.run(self.api.profile()).await {
            Ok(user) => {
                self.user = Some(user);
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("profile", &e);
            }
        }
    }

    /// Send only the fields present in `update`. An empty update is a no-op.
    pub async fn save(&mut self, update: ProfileUpdate) {
        self.saved = false;
        if update.is_empty() {
            return;
        }
        self.state.begin();
        match self.scope.run(self.api.update_profile(&update)).await {
            Ok(user) => {
                self.user = Some(user);
                self.saved = true;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("save profile", &e);
            }
        }
    }

    /// Resumes are a job-seeker feature.
    #[must_use]
    pub fn can_upload_resume(&self) -> bool {
        self.api.session().snapshot().role() == Some(Role::JobSeeker)
    }

    pub async fn upload_resume(&mut self, path: &Path) {
        self.resume_uploaded = false;
        if !self.can_upload_resume() {
            self.state.error = Some("Only job seekers can upload a resume.");
            return;
        }
        self.state.begin();
        match self.scope.run(self.api.upload_resume(path)).await {
            Ok(()) => {
                tracing::info!(file = %path.display(), "resume uploaded");
                self.resume_uploaded = true;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("upload resume", &e);
            }
        }
    }
}
