//! Fire-and-forget notification sink.
//!
//! The mutation controller reports success/failure through this trait; the
//! core never depends on delivery confirmation.

use std::sync::Mutex;

use tracing::{info, warn};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Default sink: notifications become log events.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => info!("{message}"),
            Severity::Error => warn!("{message}"),
        }
    }
}

/// Records notifications in memory, for asserting on them in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(String, Severity)> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((message.to_string(), severity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_collects_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("saved", Severity::Success);
        notifier.notify("broke", Severity::Error);

        let events = notifier.take();
        assert_eq!(
            events,
            vec![
                ("saved".to_string(), Severity::Success),
                ("broke".to_string(), Severity::Error),
            ]
        );
        assert!(notifier.take().is_empty());
    }
}
