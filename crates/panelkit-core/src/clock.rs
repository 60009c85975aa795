#![forbid(unsafe_code)]

//! Time source seam.
//!
//! Components that schedule work (close animations, retry cooldowns) read the
//! time through [`Clock`] instead of calling `Instant::now()` directly, so tests
//! and replays can drive time explicitly with [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

pub use web_time::Instant;

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time via `web_time` (works on wasm32 as well as native).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock. Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.elapsed.set(self.elapsed.get().saturating_add(delta));
    }

    /// Total time advanced since construction.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
