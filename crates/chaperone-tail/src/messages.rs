/*
[INPUT]:  Errors and notices raised by console operations
[OUTPUT]: Current page-level message + history, observable through `watch`
[POS]:    View layer - shared message area
[UPDATE]: When message levels or error surfacing rules change
*/

use std::sync::{Mutex, PoisonError};

use chaperone_adapter::ConsoleError;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::navigator::SessionNavigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// The one message region shared by the whole console.
#[derive(Debug)]
pub struct MessageArea {
    current: watch::Sender<Option<Message>>,
    history: Mutex<Vec<Message>>,
}

impl MessageArea {
    pub fn new() -> Self {
        let (current, _rx) = watch::channel(None);
        Self {
            current,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn set_error(&self, text: impl Into<String>) {
        let text = text.into();
        warn!(message = %text, "console error");
        self.publish(MessageLevel::Error, text);
    }

    pub fn set_info(&self, text: impl Into<String>) {
        let text = text.into();
        info!(message = %text, "console notice");
        self.publish(MessageLevel::Info, text);
    }

    fn publish(&self, level: MessageLevel, text: String) {
        let message = Message {
            level,
            text,
            at: Utc::now(),
        };
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        self.current.send_replace(Some(message));
    }

    /// Empty the region. History is kept.
    pub fn clear(&self) {
        self.current.send_replace(None);
    }

    pub fn current(&self) -> Option<Message> {
        self.current.borrow().clone()
    }

    pub fn current_text(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|message| message.text.clone())
    }

    pub fn history(&self) -> Vec<Message> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Message>> {
        self.current.subscribe()
    }
}

impl Default for MessageArea {
    fn default() -> Self {
        Self::new()
    }
}

/// Surface a failed console request: login redirect on 401, then the
/// formatted message in the shared area.
pub fn report_error(err: &ConsoleError, messages: &MessageArea, navigator: &SessionNavigator) {
    if err.is_auth_error() {
        navigator.redirect_to_login();
    }
    messages.set_error(err.user_message());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::sync::Arc;

    #[test]
    fn test_set_and_clear() {
        let area = MessageArea::new();
        area.set_error("Request timed out.");

        let current = area.current().expect("message");
        assert_eq!(current.level, MessageLevel::Error);
        assert_eq!(current.text, "Request timed out.");

        area.clear();
        assert!(area.current().is_none());
        assert_eq!(area.history().len(), 1);
    }

    #[test]
    fn test_latest_message_wins() {
        let area = MessageArea::new();
        area.set_info("Starting...");
        area.set_error("Unknown error.");

        assert_eq!(area.current_text().as_deref(), Some("Unknown error."));
        assert_eq!(area.history().len(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let area = MessageArea::new();
        let mut rx = area.subscribe();

        area.set_error("404 Not Found.");
        rx.changed().await.expect("sender alive");

        let seen = rx.borrow().clone().expect("message");
        assert_eq!(seen.text, "404 Not Found.");
    }

    #[test]
    fn test_report_error_redirects_on_unauthorized() {
        let document = Arc::new(Document::new());
        let navigator = SessionNavigator::new("/login", document);
        let area = MessageArea::new();

        let err = ConsoleError::Status {
            status: 401,
            status_text: "Unauthorized".to_string(),
        };
        report_error(&err, &area, &navigator);

        assert_eq!(navigator.location().as_deref(), Some("/login"));
        assert_eq!(area.current_text().as_deref(), Some("401 Unauthorized."));
    }

    #[test]
    fn test_report_error_without_redirect() {
        let document = Arc::new(Document::new());
        let navigator = SessionNavigator::new("/login", document);
        let area = MessageArea::new();

        report_error(&ConsoleError::Timeout, &area, &navigator);

        assert!(navigator.location().is_none());
        assert_eq!(area.current_text().as_deref(), Some("Request timed out."));
    }
}
