#![forbid(unsafe_code)]

//! Reactive data bindings.
//!
//! - [`Observable`]: a shared, version-tracked value with change notification
//!   via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Binding`]: a read-only view of a value, either constant, read straight
//!   from an `Observable`, or derived through a transform.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are held weakly by the observable and strongly by their
//! `Subscription`; dead entries are pruned during notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified synchronously, in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. No internal borrow is held while subscribers run, so a subscriber may
//!    read (or write) any observable, including the one notifying it.
//! 5. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod binding;
pub mod observable;

pub use binding::{Binding, bind_mapped, bind_observable};
pub use observable::{Observable, Subscription};
