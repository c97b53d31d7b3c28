//! Notification list with mark-as-read.

#[cfg(test)]
#[path = "notifications_test.rs"]
mod notifications_test;

use super::{ViewScope, ViewState};
use crate::net::api::JobBoardApi;
use crate::net::types::Notification;

pub struct NotificationsView {
    api: JobBoardApi,
    scope: ViewScope,
    pub items: Vec<Notification>,
    pub state: ViewState,
}

impl NotificationsView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self { api, scope: ViewScope::new(), items: Vec::new(), state: ViewState::default() }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self) {
        self.state.begin();
        match self.scope.run(self.api.notifications()).await {
            Ok(items) => {
                self.items = items;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("notifications", &e);
            }
        }
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    /// Mark one notification read; the local row flips only after the server agrees.
    pub async fn mark_read(&mut self, id: &str) {
        match self.scope.run(self.api.mark_notification_read(id)).await {
            Ok(()) => {
                if let Some(item) = self.items.iter_mut().find(|n| n.id == id) {
                    item.read = true;
                }
            }
            Err(e) => {
                self.state.fail("mark notification read", &e);
            }
        }
    }
}
