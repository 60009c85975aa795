#![forbid(unsafe_code)]

//! Keyboard routing for a mounted modal.
//!
//! The router is a pure function of the key event, the modal's policy and a
//! small [`RouteContext`] describing the moment of the press. It decides
//! *what* should happen; the shell performs it.

use panelkit_core::{ElementKind, KeyCode, KeyEvent};

use super::guard::CloseTrigger;

/// What the shell should do with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    /// Run the close guard for the given trigger.
    AttemptClose(CloseTrigger),
    /// Invoke the submit handler.
    Submit,
    /// Let the focus trap apply its wrap-around rule.
    Tab { backward: bool },
    /// Not handled by the modal.
    PassThrough,
}

/// State sampled at the time of a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteContext {
    /// Kind of the element that currently holds focus, if known.
    pub focused_kind: Option<ElementKind>,
    /// Whether the readiness snapshot (if any) is ready.
    pub ready: bool,
    /// Whether a submit handler is registered.
    pub has_submit: bool,
}

/// Key routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardRouter {
    pub escape_closes: bool,
    pub trap_focus: bool,
}

impl Default for KeyboardRouter {
    fn default() -> Self {
        Self {
            escape_closes: true,
            trap_focus: true,
        }
    }
}

impl KeyboardRouter {
    #[must_use]
    pub fn new(escape_closes: bool, trap_focus: bool) -> Self {
        Self {
            escape_closes,
            trap_focus,
        }
    }

    /// Route one key event. Repeat and release events are never handled.
    #[must_use]
    pub fn route(&self, key: &KeyEvent, ctx: &RouteContext) -> KeyRoute {
        if !key.is_press() {
            return KeyRoute::PassThrough;
        }

        match key.code {
            KeyCode::Escape if self.escape_closes => KeyRoute::AttemptClose(CloseTrigger::Escape),
            KeyCode::Enter if Self::submits(key, ctx) => KeyRoute::Submit,
            KeyCode::Tab | KeyCode::BackTab if self.trap_focus => KeyRoute::Tab {
                backward: key.is_back_tab(),
            },
            _ => KeyRoute::PassThrough,
        }
    }

    fn submits(key: &KeyEvent, ctx: &RouteContext) -> bool {
        ctx.has_submit
            && key.modifiers.is_empty()
            && ctx.ready
            && !ctx.focused_kind.is_some_and(ElementKind::consumes_enter)
    }
}
