#![forbid(unsafe_code)]

//! Core primitives for PanelKit: input events, the element model that focus
//! management reasons about, host seams for focus and time, and background
//! scroll locking.
//!
//! Nothing in this crate renders. Hosts translate their native input into
//! [`event::Event`] values and describe the interactive elements inside a
//! modal with [`element::Element`]; the widgets crate does the rest.

pub mod clock;
pub mod element;
pub mod event;
pub mod scroll_lock;

pub use clock::{Clock, Instant, ManualClock, SystemClock};
pub use element::{Element, ElementId, ElementKind, FocusHost, FocusRegistry};
pub use event::{
    ClickEvent, Event, HitRegion, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton,
};
pub use scroll_lock::{Overflow, ScrollGuard, ScrollLock, ScrollSurface};
