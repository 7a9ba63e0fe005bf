use std::sync::Mutex;

/// Severity of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

/// UI collaborator the guard reports login failures to. Rendering and
/// dismissal belong to the implementation.
pub trait Notifier: Send + Sync {
    fn alert(&self, level: AlertLevel, message: &str);
}

/// Keeps every alert in order of arrival.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.alerts().into_iter().map(|a| a.message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, level: AlertLevel, message: &str) {
        self.alerts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Alert {
                level,
                message: message.to_string(),
            });
    }
}
