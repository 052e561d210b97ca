use std::time::{Duration, Instant};

/// Fixed-period deadline used for asynchronous status output.
///
/// Firing re-arms the timer one period after the tick that observed it, not
/// one period after the previous deadline, so late ticks push the schedule
/// back. A deadline past the range of [`Instant`] never comes due.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Timer {
    due_at: Option<Instant>,
    period: Duration,
}

impl Timer {
    /// Creates a timer first due one `period` after `now`.
    pub(crate) fn new(now: Instant, period: Duration) -> Self {
        Self {
            due_at: now.checked_add(period),
            period,
        }
    }

    pub(crate) fn expired(&self, now: Instant) -> bool {
        self.due_at.is_some_and(|due_at| now >= due_at)
    }

    /// Returns whether the timer fired, re-arming it if so.
    pub(crate) fn tick(&mut self, now: Instant) -> bool {
        if !self.expired(now) {
            return false;
        }
        self.due_at = now.checked_add(self.period);
        true
    }
}
