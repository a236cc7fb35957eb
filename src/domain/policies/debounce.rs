//! Debounce clock
//!
//! Remembers when the last change was accepted and refuses any change that
//! lands inside the interval after it. The clock resets the moment a change
//! is accepted, not when the resulting restart finishes.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    /// True when `now` is still inside the window opened by the last accepted change
    pub fn is_within_window(&self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) => now.saturating_duration_since(last) < self.interval,
            None => false,
        }
    }

    /// Accept `now` if the window has passed, resetting the clock
    pub fn admit(&mut self, now: Instant) -> bool {
        if self.is_within_window(now) {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_is_always_admitted() {
        let mut debouncer = Debouncer::new(Duration::from_secs(1));
        assert!(debouncer.admit(Instant::now()));
    }

    #[test]
    fn events_inside_window_are_rejected() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_secs(1));
        assert!(debouncer.admit(t0));
        assert!(!debouncer.admit(t0 + Duration::from_millis(300)));
        assert!(!debouncer.admit(t0 + Duration::from_millis(999)));
        assert!(debouncer.admit(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn rejected_events_do_not_extend_the_window() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_secs(1));
        debouncer.admit(t0);
        debouncer.admit(t0 + Duration::from_millis(800));
        assert_eq!(debouncer.last_accepted(), Some(t0));
        assert!(debouncer.admit(t0 + Duration::from_millis(1001)));
    }

    #[test]
    fn earlier_timestamps_count_as_inside_window() {
        let t0 = Instant::now() + Duration::from_secs(5);
        let mut debouncer = Debouncer::new(Duration::from_secs(1));
        debouncer.admit(t0);
        assert!(debouncer.is_within_window(t0 - Duration::from_secs(2)));
    }
}
