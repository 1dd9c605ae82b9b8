//! Imperative navigation seam.

use std::sync::Mutex;

/// Router abstraction: `push` adds a history entry, `replace` swaps the current one.
pub trait Navigator: Send + Sync {
    fn push(&self, href: &str);
    fn replace(&self, href: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Push(String),
    Replace(String),
}

/// Navigator that records every call (for tests/dev).
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.lock().clone()
    }

    pub fn replaces(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                NavigationEvent::Replace(href) => Some(href.clone()),
                NavigationEvent::Push(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NavigationEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, href: &str) {
        self.lock().push(NavigationEvent::Push(href.to_string()));
    }

    fn replace(&self, href: &str) {
        self.lock().push(NavigationEvent::Replace(href.to_string()));
    }
}

/// Navigator for headless use: only logs the requested transitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn push(&self, href: &str) {
        tracing::info!(href, "navigate");
    }

    fn replace(&self, href: &str) {
        tracing::info!(href, "redirect");
    }
}
