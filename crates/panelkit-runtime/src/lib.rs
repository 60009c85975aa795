#![forbid(unsafe_code)]

//! Runtime support for PanelKit components.
//!
//! - [`reactive`]: change-tracked values with explicit subscriptions, used to
//!   recompute derived state (readiness, focusable sets) whenever a named
//!   input changes.
//! - [`timer`]: a polled one-shot timer for scheduled transitions.

pub mod reactive;
pub mod timer;

pub use reactive::{Binding, Observable, Subscription, bind_mapped, bind_observable};
pub use timer::OneShotTimer;
