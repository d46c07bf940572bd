//! User-facing notifications. The dashboard raises one per fallback; the
//! embedding surface decides how to show it.

use serde::Serialize;
use std::sync::Mutex;

use crate::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    fn level(&self) -> Level {
        match self {
            Severity::Info | Severity::Success => Level::Info,
            Severity::Warning => Level::Warn,
            Severity::Error => Level::Error,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Writes notifications into the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        log(
            severity.level(),
            Domain::Notify,
            "notification",
            obj(&[("msg", v_str(message)), ("severity", v_str(severity.as_str()))]),
        );
    }
}

/// Keeps every notification in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(String, Severity)> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.notifications().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.push((message.to_string(), severity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order() {
        let n = RecordingNotifier::new();
        n.notify("first", Severity::Info);
        n.notify("second", Severity::Warning);
        assert_eq!(
            n.notifications(),
            vec![
                ("first".to_string(), Severity::Info),
                ("second".to_string(), Severity::Warning)
            ]
        );
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Success).unwrap(), "\"success\"");
        assert_eq!(Severity::Error.as_str(), "error");
    }

    #[test]
    fn log_notifier_does_not_panic() {
        LogNotifier.notify(
            "Country list unavailable; showing demo country list.",
            Severity::Warning,
        );
    }
}
