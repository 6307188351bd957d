//! Debounce state machine for free-text search input.
//!
//! The visible input control echoes keystrokes with zero latency; the query
//! the state machine commits (and therefore the fetch and the URL write)
//! only fires after a quiet period. Modeled explicitly as a timer-owning
//! `pending(value, deadline)` state that collapses on each keystroke and
//! fires exactly one downstream event at the deadline.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending {
    value: String,
    deadline: Instant,
}

/// Collapses a burst of keystrokes into one committed value.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a keystroke. Any pending value collapses into this one and the
    /// deadline restarts.
    pub fn input(&mut self, value: &str, now: Instant) {
        self.pending = Some(Pending {
            value: value.to_string(),
            deadline: now + self.window,
        });
    }

    /// Fire the pending value if its quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending.take().map(|p| p.value)
            }
            _ => None,
        }
    }

    /// Drop the pending value without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// When the pending value becomes eligible to fire, if any. Drivers sleep
    /// until this instant.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_does_not_fire_before_window() {
        let mut debounce = Debouncer::new(WINDOW);
        let start = Instant::now();

        debounce.input("hello", start);
        assert_eq!(debounce.fire(start + Duration::from_millis(200)), None);
        assert!(debounce.is_pending());
    }

    #[test]
    fn test_fires_after_window() {
        let mut debounce = Debouncer::new(WINDOW);
        let start = Instant::now();

        debounce.input("hello", start);
        assert_eq!(
            debounce.fire(start + WINDOW),
            Some("hello".to_string())
        );
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_rapid_keystrokes_collapse() {
        let mut debounce = Debouncer::new(WINDOW);
        let start = Instant::now();

        debounce.input("a", start);
        debounce.input("ab", start + Duration::from_millis(150));
        debounce.input("abc", start + Duration::from_millis(300));

        // 300ms after the first keystroke the timer has been reset twice.
        assert_eq!(debounce.fire(start + Duration::from_millis(300)), None);

        // One quiet window after the last keystroke, the final value fires.
        assert_eq!(
            debounce.fire(start + Duration::from_millis(600)),
            Some("abc".to_string())
        );

        // Exactly once.
        assert_eq!(debounce.fire(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut debounce = Debouncer::new(WINDOW);
        let start = Instant::now();

        debounce.input("doomed", start);
        debounce.cancel();
        assert_eq!(debounce.fire(start + WINDOW), None);
    }
}
