#![forbid(unsafe_code)]

//! Polled one-shot timer.
//!
//! Scheduled transitions (the close-animation delay, retry cooldowns) are
//! modelled as a deadline that the owner polls with the current time from its
//! [`Clock`](panelkit_core::Clock). Nothing runs in the background; a timer
//! that is polled after its owner stopped caring simply returns `false` once
//! cancelled.
//!
//! # Invariants
//!
//! - `poll` returns `true` at most once per `arm`.
//! - Re-arming replaces any pending deadline.
//! - `cancel` makes all subsequent polls return `false` until re-armed.

use std::time::Duration;

use panelkit_core::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

impl OneShotTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedule the timer to fire `delay` after `now`.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            tracing::trace!("one-shot timer cancelled");
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before firing, `None` if not armed.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns `true` exactly once, the first time it is polled at or after
    /// the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                tracing::trace!(late = ?now.saturating_duration_since(deadline), "one-shot timer fired");
                true
            }
            _ => false,
        }
    }
}
