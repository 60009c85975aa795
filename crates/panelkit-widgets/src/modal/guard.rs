#![forbid(unsafe_code)]

//! Close guard.
//!
//! Every attempt to dismiss a modal (close button, Escape, backdrop click)
//! goes through [`CloseGuard::evaluate`], which runs, in order:
//!
//! 1. the host's custom `can_close` predicate, if any;
//! 2. the unsaved-changes confirmation, if the unsaved flag is set;
//! 3. otherwise approves.
//!
//! Denials are not errors. They are reported to the host through the
//! `on_close_prevented` callback so it can react (show a toast, flash the
//! form), exactly once per denied attempt.

use std::fmt;
use std::rc::Rc;

use panelkit_runtime::reactive::Binding;

/// What initiated a close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseTrigger {
    Button,
    Escape,
    Backdrop,
}

impl CloseTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Escape => "escape",
            Self::Backdrop => "backdrop",
        }
    }
}

impl fmt::Display for CloseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a close attempt was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreventReason {
    /// The host's `can_close` predicate returned `false`.
    CustomValidation,
    /// The user declined the unsaved-changes confirmation.
    UnsavedChangesDeclined,
}

impl PreventReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomValidation => "custom validation failed",
            Self::UnsavedChangesDeclined => "unsaved changes confirmation cancelled",
        }
    }
}

impl fmt::Display for PreventReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Approved,
    Denied(PreventReason),
    /// A close is already under way; the attempt was ignored.
    AlreadyClosing,
}

impl CloseDecision {
    #[must_use]
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Blocking yes/no confirmation presented to the user.
pub trait Confirm {
    /// Show `message`; return `true` if the user chose to proceed.
    fn confirm(&self, message: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Callback for denied close attempts.
type ClosePreventedHandler = Rc<dyn Fn(CloseTrigger, PreventReason)>;

/// Decides whether a close attempt may proceed.
#[derive(Clone)]
pub struct CloseGuard {
    can_close: Option<Rc<dyn Fn() -> bool>>,
    unsaved_changes: Binding<bool>,
    message: String,
    confirm: Rc<dyn Confirm>,
    on_prevented: Option<ClosePreventedHandler>,
}

impl fmt::Debug for CloseGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseGuard")
            .field("can_close", &self.can_close.is_some())
            .field("unsaved_changes", &self.unsaved_changes.get())
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl CloseGuard {
    /// A guard with no predicate and no unsaved changes.
    ///
    /// Without an explicit [`Confirm`] provider the unsaved-changes prompt is
    /// treated as declined.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            can_close: None,
            unsaved_changes: Binding::constant(false),
            message: message.into(),
            confirm: Rc::new(|_: &str| false),
            on_prevented: None,
        }
    }

    #[must_use]
    pub fn can_close(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.can_close = Some(Rc::new(predicate));
        self
    }

    #[must_use]
    pub fn unsaved_changes(mut self, flag: impl Into<Binding<bool>>) -> Self {
        self.unsaved_changes = flag.into();
        self
    }

    /// Replace the unsaved-changes prompt.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn confirm_with(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Rc::new(confirm);
        self
    }

    #[must_use]
    pub fn on_prevented(
        mut self,
        handler: impl Fn(CloseTrigger, PreventReason) + 'static,
    ) -> Self {
        self.on_prevented = Some(Rc::new(handler));
        self
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes.get()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the guard pipeline for one attempt.
    pub fn evaluate(&self, trigger: CloseTrigger) -> CloseDecision {
        let denial = if self.can_close.as_ref().is_some_and(|pred| !pred()) {
            Some(PreventReason::CustomValidation)
        } else if self.unsaved_changes.get() && !self.confirm.confirm(&self.message) {
            Some(PreventReason::UnsavedChangesDeclined)
        } else {
            None
        };

        match denial {
            Some(reason) => {
                tracing::info!(%trigger, %reason, "close prevented");
                if let Some(handler) = &self.on_prevented {
                    handler(trigger, reason);
                }
                CloseDecision::Denied(reason)
            }
            None => {
                tracing::debug!(%trigger, "close approved");
                CloseDecision::Approved
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelkit_runtime::reactive::{Observable, bind_observable};
    use std::cell::{Cell, RefCell};
    use tracing_test::traced_test;

    type Log = Rc<RefCell<Vec<(CloseTrigger, PreventReason)>>>;

    fn recorder() -> (impl Fn(CloseTrigger, PreventReason) + 'static, Log) {
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        let handler = move |trigger: CloseTrigger, reason: PreventReason| {
            sink.borrow_mut().push((trigger, reason));
        };
        (handler, log)
    }

    #[test]
    fn approves_by_default() {
        let guard = CloseGuard::new("unsaved");
        assert_eq!(guard.evaluate(CloseTrigger::Button), CloseDecision::Approved);
    }

    #[test]
    fn custom_predicate_denies_first() {
        let confirms = Rc::new(Cell::new(0));
        let counter = Rc::clone(&confirms);
        let (handler, log) = recorder();
        let guard = CloseGuard::new("unsaved")
            .can_close(|| false)
            .unsaved_changes(true)
            .confirm_with(move |_: &str| {
                counter.set(counter.get() + 1);
                true
            })
            .on_prevented(handler);

        assert_eq!(
            guard.evaluate(CloseTrigger::Escape),
            CloseDecision::Denied(PreventReason::CustomValidation)
        );
        assert_eq!(confirms.get(), 0, "confirmation skipped after predicate denial");
        assert_eq!(
            *log.borrow(),
            vec![(CloseTrigger::Escape, PreventReason::CustomValidation)]
        );
    }

    #[test]
    fn unsaved_changes_confirmed_approves() {
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);
        let guard = CloseGuard::new("¿Descartar cambios?")
            .unsaved_changes(true)
            .confirm_with(move |msg: &str| {
                sink.borrow_mut().push_str(msg);
                true
            });
        assert!(guard.evaluate(CloseTrigger::Button).is_approved());
        assert_eq!(*seen.borrow(), "¿Descartar cambios?");
    }

    #[test]
    fn unsaved_changes_declined_denies_once_per_attempt() {
        let (handler, log) = recorder();
        let guard = CloseGuard::new("unsaved")
            .unsaved_changes(true)
            .confirm_with(|_: &str| false)
            .on_prevented(handler);

        for _ in 0..3 {
            assert_eq!(
                guard.evaluate(CloseTrigger::Escape),
                CloseDecision::Denied(PreventReason::UnsavedChangesDeclined)
            );
        }
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn missing_confirm_provider_declines() {
        let guard = CloseGuard::new("unsaved").unsaved_changes(true);
        assert_eq!(
            guard.evaluate(CloseTrigger::Backdrop),
            CloseDecision::Denied(PreventReason::UnsavedChangesDeclined)
        );
    }

    #[test]
    fn unsaved_flag_is_live() {
        let dirty = Observable::new(false);
        let guard = CloseGuard::new("unsaved")
            .unsaved_changes(bind_observable(&dirty))
            .confirm_with(|_: &str| false);

        assert!(guard.evaluate(CloseTrigger::Button).is_approved());
        dirty.set(true);
        assert!(!guard.evaluate(CloseTrigger::Button).is_approved());
        assert!(guard.has_unsaved_changes());
    }

    #[test]
    fn reason_strings() {
        assert_eq!(
            PreventReason::CustomValidation.to_string(),
            "custom validation failed"
        );
        assert_eq!(
            PreventReason::UnsavedChangesDeclined.to_string(),
            "unsaved changes confirmation cancelled"
        );
        assert_eq!(CloseTrigger::Backdrop.to_string(), "backdrop");
    }

    #[test]
    #[traced_test]
    fn denial_is_logged() {
        let guard = CloseGuard::new("unsaved").can_close(|| false);
        guard.evaluate(CloseTrigger::Button);
        assert!(logs_contain("close prevented"));
        assert!(logs_contain("custom validation failed"));
    }
}
