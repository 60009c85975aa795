#![forbid(unsafe_code)]

//! Read-only bindings.
//!
//! A [`Binding<T>`] answers "what is the value right now?" without the reader
//! caring whether the value is a constant, lives in an [`Observable`], or is
//! derived from one. Modal options that the host may flip at any time (such as
//! the unsaved-changes flag) are accepted as bindings.
//!
//! ```
//! use panelkit_runtime::reactive::{Binding, Observable, bind_mapped};
//!
//! let dirty_fields = Observable::new(0usize);
//! let has_changes = bind_mapped(&dirty_fields, |n| *n > 0);
//! assert!(!has_changes.get());
//!
//! dirty_fields.set(2);
//! assert!(has_changes.get());
//!
//! let fixed = Binding::constant(true);
//! assert!(fixed.get());
//! ```
//!
//! # Invariants
//!
//! 1. `get()` always evaluates against current source state (no caching).
//! 2. Clones share the same evaluation closure.

use std::fmt;
use std::rc::Rc;

use super::observable::Observable;

/// A read-only, possibly derived value.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("value", &self.get())
            .finish()
    }
}

impl<T: 'static> Binding<T> {
    /// Binding that evaluates `f` on each `get()`.
    pub fn new(f: impl Fn() -> T + 'static) -> Self {
        Self { eval: Rc::new(f) }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        (self.eval)()
    }

    /// Chain a further transform.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Binding<U> {
        Binding {
            eval: Rc::new(move || f((self.eval)())),
        }
    }
}

impl<T: Clone + 'static> Binding<T> {
    /// Binding that always yields `value`.
    pub fn constant(value: T) -> Self {
        Self {
            eval: Rc::new(move || value.clone()),
        }
    }
}

impl<T: Default + Clone + 'static> Default for Binding<T> {
    fn default() -> Self {
        Self::constant(T::default())
    }
}

impl<T: Clone + 'static> From<T> for Binding<T> {
    fn from(value: T) -> Self {
        Self::constant(value)
    }
}

/// Direct binding to an observable.
pub fn bind_observable<T: Clone + PartialEq + 'static>(source: &Observable<T>) -> Binding<T> {
    let src = source.clone();
    Binding {
        eval: Rc::new(move || src.get()),
    }
}

/// Binding to `source` transformed by `map`.
pub fn bind_mapped<S: Clone + PartialEq + 'static, T: 'static>(
    source: &Observable<S>,
    map: impl Fn(&S) -> T + 'static,
) -> Binding<T> {
    let src = source.clone();
    Binding {
        eval: Rc::new(move || src.with(|v| map(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_binding() {
        let b = Binding::constant(7);
        assert_eq!(b.get(), 7);
        assert_eq!(b.clone().get(), 7);
    }

    #[test]
    fn observable_binding_tracks_source() {
        let obs = Observable::new(false);
        let b = bind_observable(&obs);
        assert!(!b.get());
        obs.set(true);
        assert!(b.get());
    }

    #[test]
    fn mapped_binding() {
        let obs = Observable::new(3);
        let b = bind_mapped(&obs, |v| v * 10);
        assert_eq!(b.get(), 30);
        obs.set(4);
        assert_eq!(b.get(), 40);
    }

    #[test]
    fn map_chains() {
        let obs = Observable::new(2);
        let b = bind_observable(&obs).map(|v| v + 1).map(|v| format!("n={v}"));
        assert_eq!(b.get(), "n=3");
    }

    #[test]
    fn from_conversions() {
        let b: Binding<bool> = true.into();
        assert!(b.get());
    }

    #[test]
    fn default_binding_uses_default_value() {
        let b: Binding<bool> = Binding::default();
        assert!(!b.get());
    }
}
