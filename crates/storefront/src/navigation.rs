//! Navigation signals.
//!
//! The session store and the route gate never render anything themselves;
//! they ask the [`Navigator`] to move to a path, and whatever front-end is
//! attached follows along through [`Navigator::subscribe`].

use std::sync::{Mutex, PoisonError};

use artisan_backend::{Broadcaster, Subscription};

use crate::routes::DEFAULT_LANDING;

/// Current location plus a stream of navigation requests.
pub struct Navigator {
    current: Mutex<String>,
    events: Broadcaster<String>,
}

impl Navigator {
    /// A navigator positioned at the home page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(DEFAULT_LANDING.to_string()),
            events: Broadcaster::new(),
        }
    }

    /// Move to `path` and notify subscribers.
    pub fn navigate(&self, path: impl Into<String>) {
        let path = path.into();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(from = %current, to = %path, "Navigate");
        (*current).clone_from(&path);
        // Publish under the lock so subscribers see requests in order.
        self.events.publish(path);
    }

    /// The path most recently navigated to.
    pub fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Navigation requests made after this call.
    pub fn subscribe(&self) -> Subscription<String> {
        self.events.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &self.current_path())
            .finish_non_exhaustive()
    }
}
