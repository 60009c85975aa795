#![forbid(unsafe_code)]

//! Reference-counted background scroll suppression.
//!
//! While any modal is mounted the page (or terminal viewport) behind it must
//! not scroll. [`ScrollLock`] wraps the host's [`ScrollSurface`] and hands out
//! RAII [`ScrollGuard`]s:
//!
//! 1. The first guard saves the surface's current [`Overflow`] and sets it to
//!    [`Overflow::Hidden`].
//! 2. Further guards only bump the holder count.
//! 3. Dropping the last guard restores the saved value.
//!
//! Cleanup lives in `Drop`, so a modal torn down on any path releases its hold.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Scroll behaviour of the background surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Auto,
    Scroll,
    Hidden,
}

/// The host's scrollable background.
pub trait ScrollSurface {
    fn overflow(&self) -> Overflow;
    fn set_overflow(&mut self, overflow: Overflow);
}

/// A shared cell works as a surface; handy for hosts that poll a flag.
impl ScrollSurface for Rc<std::cell::Cell<Overflow>> {
    fn overflow(&self) -> Overflow {
        self.get()
    }

    fn set_overflow(&mut self, overflow: Overflow) {
        self.set(overflow);
    }
}

struct LockInner {
    surface: Box<dyn ScrollSurface>,
    holders: usize,
    saved: Option<Overflow>,
}

impl LockInner {
    fn acquire(&mut self) {
        if self.holders == 0 {
            let prior = self.surface.overflow();
            self.saved = Some(prior);
            self.surface.set_overflow(Overflow::Hidden);
            tracing::debug!(?prior, "background scroll suppressed");
        }
        self.holders += 1;
    }

    fn release(&mut self) {
        debug_assert!(self.holders > 0, "scroll lock released more than acquired");
        self.holders = self.holders.saturating_sub(1);
        if self.holders == 0
            && let Some(prior) = self.saved.take()
        {
            self.surface.set_overflow(prior);
            tracing::debug!(?prior, "background scroll restored");
        }
    }
}

/// Shared scroll suppressor. Clones refer to the same lock.
#[derive(Clone)]
pub struct ScrollLock {
    inner: Rc<RefCell<LockInner>>,
}

impl fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ScrollLock")
            .field("holders", &inner.holders)
            .field("saved", &inner.saved)
            .finish()
    }
}

impl ScrollLock {
    pub fn new(surface: impl ScrollSurface + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LockInner {
                surface: Box::new(surface),
                holders: 0,
                saved: None,
            })),
        }
    }

    /// Take a hold on the lock. The hold is released when the guard drops.
    #[must_use = "dropping the guard immediately releases the scroll lock"]
    pub fn acquire(&self) -> ScrollGuard {
        self.inner.borrow_mut().acquire();
        ScrollGuard {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Number of live guards.
    #[must_use]
    pub fn holders(&self) -> usize {
        self.inner.borrow().holders
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.holders() > 0
    }
}

/// RAII hold on a [`ScrollLock`].
#[must_use = "dropping the guard releases the scroll lock"]
pub struct ScrollGuard {
    inner: Rc<RefCell<LockInner>>,
}

impl fmt::Debug for ScrollGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollGuard").finish_non_exhaustive()
    }
}

impl Drop for ScrollGuard {
    fn drop(&mut self) {
        self.inner.borrow_mut().release();
    }
}
