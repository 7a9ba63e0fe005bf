//! Page location port and link-click events.

use std::sync::{Mutex, MutexGuard};

/// Abstraction over the page's location.
/// Implementations: HistoryNavigator (in memory); a browser binding would
/// wrap `window.location`.
pub trait Navigator: Send + Sync {
    /// Path component of the current location.
    fn current_path(&self) -> String;

    /// Navigate without leaving a history entry.
    fn replace(&self, path: &str);

    /// Navigate, pushing a new history entry.
    fn assign(&self, path: &str);
}

/// In-memory session history.
pub struct HistoryNavigator {
    entries: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![start.into()]),
        }
    }

    /// All history entries, oldest first. The last entry is the current page.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.lock().last().cloned().unwrap_or_else(|| "/".into())
    }

    fn replace(&self, path: &str) {
        let mut entries = self.lock();
        match entries.last_mut() {
            Some(current) => *current = path.to_string(),
            None => entries.push(path.to_string()),
        }
    }

    fn assign(&self, path: &str) {
        self.lock().push(path.to_string());
    }
}

/// A click on an anchor element.
#[derive(Debug, Clone, Default)]
pub struct LinkClick {
    /// The anchor's raw `href` attribute, if any.
    pub href: Option<String>,
}

impl LinkClick {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
        }
    }

    /// A click that did not land on an anchor.
    pub fn none() -> Self {
        Self { href: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// The guard does not apply or a token is present.
    Allow,
    /// The default navigation must be prevented; the page was sent to the
    /// login boundary instead.
    Cancelled,
}
