//! Pending-write holder with a deadline.
//!
//! Holds at most one value. Each [`Debouncer::push`] replaces the pending
//! value and moves the deadline to `now + delay`, so a burst of changes
//! collapses into the last one once the burst has been quiet for `delay`.

use std::time::Duration;

use crate::runtime::Instant;

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Last-write-wins debouncer.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The configured quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period.
    ///
    /// Returns the value that was superseded, if any.
    pub fn push(&mut self, value: T, now: Instant) -> Option<T> {
        let previous = self.pending.replace(Pending {
            value,
            deadline: now + self.delay,
        });
        previous.map(|p| p.value)
    }

    /// When the pending value becomes due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether a value is waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Take the pending value regardless of its deadline.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Drop the pending value. Returns whether anything was dropped.
    pub fn discard(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn nothing_due_before_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        assert!(d.push(1, t0).is_none());
        assert_eq!(d.poll(t0 + Duration::from_millis(499)), None);
        assert_eq!(d.poll(t0 + DELAY), Some(1));
        assert!(!d.is_pending());
    }

    #[test]
    fn push_restarts_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push("first", t0);
        let superseded = d.push("second", t0 + Duration::from_millis(300));
        assert_eq!(superseded, Some("first"));
        assert_eq!(d.poll(t0 + DELAY), None);
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(800)));
        assert_eq!(d.poll(t0 + Duration::from_millis(800)), Some("second"));
    }

    #[test]
    fn discard_drops_pending_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push(7, t0);
        assert!(d.discard());
        assert!(!d.discard());
        assert_eq!(d.poll(t0 + DELAY * 2), None);
    }

    #[test]
    fn take_ignores_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push(3, t0);
        assert_eq!(d.take(), Some(3));
        assert_eq!(d.take(), None);
    }

    proptest! {
        #[test]
        fn burst_yields_only_last_value(gaps in proptest::collection::vec(0u64..500, 1..20)) {
            let t0 = Instant::now();
            let mut d = Debouncer::new(DELAY);
            let mut now = t0;
            let mut fired = Vec::new();
            for (i, gap) in gaps.iter().enumerate() {
                now += Duration::from_millis(*gap);
                if let Some(v) = d.poll(now) {
                    fired.push(v);
                }
                d.push(i, now);
            }
            if let Some(v) = d.poll(now + DELAY) {
                fired.push(v);
            }
            prop_assert_eq!(fired, vec![gaps.len() - 1]);
        }
    }
}
