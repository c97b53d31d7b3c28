//! Messaging center: conversation list, one open thread, a draft box.

#[cfg(test)]
#[path = "messages_test.rs"]
mod messages_test;

use super::{ViewScope, ViewState};
use crate::net::api::JobBoardApi;
use crate::net::types::{Conversation, Message};

pub struct MessagingView {
    api: JobBoardApi,
    scope: ViewScope,
    pub conversations: Vec<Conversation>,
    /// Counterpart of the open thread.
    pub selected: Option<String>,
    pub thread: Vec<Message>,
    pub draft: String,
    pub state: ViewState,
}

impl MessagingView {
    #[must_use]
    pub fn new(api: JobBoardApi) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            conversations: Vec::new(),
            selected: None,
            thread: Vec::new(),
            draft: String::new(),
            state: ViewState::default(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load_conversations(&mut self) {
        self.state.begin();
        match self.scope.run(self.api.conversations()).await {
            Ok(conversations) => {
                self.conversations = conversations;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("conversations", &e);
            }
        }
    }

    /// Select a conversation and fetch its messages.
    pub async fn open(&mut self, user_id: &str) {
        self.selected = Some(user_id.to_owned());
        self.thread.clear();
        self.refresh_thread().await;
    }

    async fn refresh_thread(&mut self) {
        let Some(user_id) = self.selected.clone() else {
            return;
        };
        self.state.begin();
        match self.scope.run(self.api.messages(&user_id)).await {
            Ok(messages) => {
                self.thread = messages;
                self.state.finish();
            }
            Err(e) => {
                self.state.fail("messages", &e);
            }
        }
    }

    /// Send the draft to the open conversation. Whitespace-only drafts and a
    /// missing selection are ignored. Returns whether a message went out.
    pub async fn send(&mut self) -> bool {
        let content = self.draft.trim().to_owned();
        let Some(receiver) = self.selected.clone() else {
            return false;
        };
        if content.is_empty() {
            return false;
        }
        let sent = self.scope.run(self.api.send_message(&receiver, &content)).await;
        match sent {
            Ok(_) => {
                self.draft.clear();
                self.refresh_thread().await;
                true
            }
            Err(e) => {
                self.state.fail("send message", &e);
                false
            }
        }
    }

    /// Whether `message` was written by the signed-in user.
    #[must_use]
    pub fn is_own(&self, message: &Message) -> bool {
        self.api.session().snapshot().user().is_some_and(|u| u.id == message.sender_id)
    }
}
