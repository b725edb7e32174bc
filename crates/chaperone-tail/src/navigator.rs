/*
[INPUT]:  Session expiry signals (401 responses)
[OUTPUT]: Single navigation to the login route, page regions torn down
[POS]:    Session layer - authentication side effects
[UPDATE]: When login routing or session handling changes
*/

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::document::Document;

/// Tracks where the console would navigate to.
#[derive(Debug)]
pub struct SessionNavigator {
    login_path: String,
    document: Arc<Document>,
    redirected: AtomicBool,
    redirects: AtomicUsize,
    location: Mutex<Option<String>>,
}

impl SessionNavigator {
    pub fn new(login_path: impl Into<String>, document: Arc<Document>) -> Self {
        Self {
            login_path: login_path.into(),
            document,
            redirected: AtomicBool::new(false),
            redirects: AtomicUsize::new(0),
            location: Mutex::new(None),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Navigate to the login route. Only the first caller navigates; later
    /// calls return false.
    pub fn redirect_to_login(&self) -> bool {
        if self
            .redirected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        self.redirects.fetch_add(1, Ordering::AcqRel);
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(self.login_path.clone());
        warn!(login_path = %self.login_path, "session expired; navigating to login");

        // Leaving the page removes every region.
        self.document.clear();
        true
    }

    pub fn location(&self) -> Option<String> {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::Acquire)
    }

    pub fn is_redirected(&self) -> bool {
        self.redirected.load(Ordering::Acquire)
    }
}
