#![forbid(unsafe_code)]

//! Modal orchestration: panels, readiness gating, focus trapping, guarded
//! close, and render failure recovery.
//!
//! Components, leaf first:
//!
//! - [`ReadinessTracker`]: folds named async dependencies into a
//!   [`ReadinessSnapshot`] that gates the modal body.
//! - [`FocusTrap`]: keeps Tab inside the modal and restores focus afterwards.
//! - [`PanelStateMachine`]: which named panel is visible.
//! - [`CloseGuard`] and [`KeyboardRouter`]: decide what a key press or close
//!   attempt does.
//! - [`ModalShell`]: composes the above and drives the two-phase close.
//! - [`RenderFailureBoundary`]: wraps a shell and replaces it with a
//!   recoverable fallback when rendering fails.
//! - [`ModalStack`]: several open modals, input to the top one only.
//!
//! Every entity belongs to exactly one modal instance. The only shared
//! resource is the background [`ScrollLock`](panelkit_core::ScrollLock).
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use panelkit_core::{Event, KeyCode, KeyEvent, ManualClock};
//! use panelkit_widgets::modal::{
//!     CloseDecision, Dependency, ModalShell, PanelName, ReadinessTracker, RenderError,
//!     ShellAction,
//! };
//!
//! let clock = Rc::new(ManualClock::new());
//! let project = Dependency::new("project");
//! let mut shell = ModalShell::builder(|panel: &PanelName| {
//!     Ok::<_, RenderError>(format!("{panel} form"))
//! })
//! .title("Editar proyecto")
//! .initial_panel(PanelName::Edit)
//! .readiness(ReadinessTracker::builder().critical(project.clone()).build())
//! .clock(clock.clone())
//! .build();
//!
//! assert!(shell.view().unwrap().content().is_none());
//! project.succeed();
//! assert_eq!(shell.view().unwrap().content().map(String::as_str), Some("edit form"));
//!
//! let escape = Event::Key(KeyEvent::new(KeyCode::Escape));
//! assert_eq!(
//!     shell.handle_event(&escape),
//!     ShellAction::CloseAttempted(CloseDecision::Approved)
//! );
//! ```

mod boundary;
mod config;
mod focus_trap;
mod guard;
mod keyboard;
mod panel;
mod readiness;
mod shell;
mod stack;
mod strings;

pub use boundary::{
    BoundaryState, BoundaryTarget, BoundaryView, FallbackAction, FallbackView, RenderError,
    RenderFailureBoundary, RetryBudget,
};
pub use config::{ConfigError, ModalConfig};
pub use focus_trap::{
    FocusRegion, FocusTrap, FocusTrapOptions, FocusableSet, InitialFocus, TabOutcome,
};
pub use guard::{CloseDecision, CloseGuard, CloseTrigger, Confirm, PreventReason};
pub use keyboard::{KeyRoute, KeyboardRouter, RouteContext};
pub use panel::{PanelChangeHandler, PanelName, PanelStateMachine};
pub use readiness::{
    Dependency, DependencyError, DependencyState, ReadinessError, ReadinessSnapshot,
    ReadinessTracker, ReadinessTrackerBuilder, RequiredId, evaluate,
};
pub use shell::{
    Animation, BodyView, ClosePhase, DialogAttributes, FooterView, HeaderView, MODAL_HIT_BACKDROP,
    MODAL_HIT_CONTENT, ModalId, ModalShell, ModalShellBuilder, PanelContent, ShellAction,
    ShellView,
};
pub use stack::{ModalStack, StackModal};
pub use strings::ModalStrings;
