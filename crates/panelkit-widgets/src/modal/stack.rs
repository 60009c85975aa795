#![forbid(unsafe_code)]

//! Modal stack for several simultaneously open modals.
//!
//! # Invariants
//!
//! - Order is LIFO: later modals are always on top.
//! - Only the top modal receives input events.
//! - All stacked modals share one [`ScrollLock`]; background scroll is
//!   restored only when the last of them lets go.
//!
//! # Failure Modes
//!
//! - `pop()` on an empty stack returns `None`.
//! - `pop_id()` for an unknown id returns `None`.
//! - Events delivered to an empty stack are ignored.

use panelkit_core::{Event, ScrollLock};

use super::boundary::{BoundaryState, RenderFailureBoundary};
use super::guard::{CloseDecision, CloseTrigger};
use super::shell::{
    ClosePhase, ModalId, ModalShell, ModalShellBuilder, PanelContent, ShellAction,
};

/// A modal that can live in a [`ModalStack`].
pub trait StackModal {
    fn modal_id(&self) -> ModalId;

    fn handle_event(&mut self, event: &Event) -> ShellAction;

    fn attempt_close(&mut self, trigger: CloseTrigger) -> CloseDecision;

    /// Advance scheduled transitions and report the phase.
    fn tick(&mut self) -> ClosePhase;
}

impl<C: PanelContent> StackModal for ModalShell<C> {
    fn modal_id(&self) -> ModalId {
        self.id()
    }

    fn handle_event(&mut self, event: &Event) -> ShellAction {
        ModalShell::handle_event(self, event)
    }

    fn attempt_close(&mut self, trigger: CloseTrigger) -> CloseDecision {
        ModalShell::attempt_close(self, trigger)
    }

    fn tick(&mut self) -> ClosePhase {
        ModalShell::tick(self)
    }
}

/// A shell behind a failure boundary. While the fallback is showing, input
/// goes to the fallback's actions, not the shell.
impl<C: PanelContent> StackModal for RenderFailureBoundary<ModalShell<C>> {
    fn modal_id(&self) -> ModalId {
        self.target().id()
    }

    fn handle_event(&mut self, event: &Event) -> ShellAction {
        if self.state() != BoundaryState::Healthy {
            return ShellAction::Ignored;
        }
        self.target_mut().handle_event(event)
    }

    fn attempt_close(&mut self, trigger: CloseTrigger) -> CloseDecision {
        self.target_mut().attempt_close(trigger)
    }

    fn tick(&mut self) -> ClosePhase {
        self.target_mut().tick()
    }
}

/// LIFO stack of open modals.
pub struct ModalStack {
    modals: Vec<Box<dyn StackModal>>,
    scroll_lock: ScrollLock,
}

impl std::fmt::Debug for ModalStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalStack")
            .field("ids", &self.ids())
            .field("scroll_lock", &self.scroll_lock)
            .finish()
    }
}

impl ModalStack {
    /// Create an empty stack over the host's scroll lock.
    pub fn new(scroll_lock: ScrollLock) -> Self {
        Self {
            modals: Vec::new(),
            scroll_lock,
        }
    }

    /// Lock to hand to each shell builder pushed onto this stack.
    #[must_use]
    pub fn scroll_lock(&self) -> ScrollLock {
        self.scroll_lock.clone()
    }

    /// Mount a shell on this stack's scroll lock and push it on top.
    pub fn open<C: PanelContent + 'static>(&mut self, builder: ModalShellBuilder<C>) -> ModalId {
        let shell = builder.scroll_lock(self.scroll_lock()).build();
        self.push(Box::new(shell))
    }

    /// Push an already mounted modal on top.
    ///
    /// The modal must have been built with [`ModalStack::scroll_lock`];
    /// otherwise it does not take part in background scroll suppression.
    /// Use [`ModalStack::open`] for plain shells.
    pub fn push(&mut self, modal: Box<dyn StackModal>) -> ModalId {
        let id = modal.modal_id();
        tracing::debug!(modal = id.get(), depth = self.modals.len() + 1, "modal pushed");
        self.modals.push(modal);
        id
    }

    /// Remove the top modal without running its close protocol.
    pub fn pop(&mut self) -> Option<ModalId> {
        self.modals.pop().map(|m| m.modal_id())
    }

    /// Remove a specific modal. Breaks LIFO order.
    pub fn pop_id(&mut self, id: ModalId) -> Option<ModalId> {
        let idx = self.modals.iter().position(|m| m.modal_id() == id)?;
        Some(self.modals.remove(idx).modal_id())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modals.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.modals.len()
    }

    #[must_use]
    pub fn contains(&self, id: ModalId) -> bool {
        self.modals.iter().any(|m| m.modal_id() == id)
    }

    #[must_use]
    pub fn top_id(&self) -> Option<ModalId> {
        self.modals.last().map(|m| m.modal_id())
    }

    /// Bottom-to-top ids.
    #[must_use]
    pub fn ids(&self) -> Vec<ModalId> {
        self.modals.iter().map(|m| m.modal_id()).collect()
    }

    /// Route an event to the top modal only.
    pub fn handle_event(&mut self, event: &Event) -> ShellAction {
        match self.modals.last_mut() {
            Some(top) => top.handle_event(event),
            None => ShellAction::Ignored,
        }
    }

    /// Close button on the top modal.
    pub fn close_top(&mut self) -> Option<CloseDecision> {
        self.modals
            .last_mut()
            .map(|top| top.attempt_close(CloseTrigger::Button))
    }

    /// Advance every modal and drop those whose close committed.
    ///
    /// Returns the ids removed, bottom to top.
    pub fn tick(&mut self) -> Vec<ModalId> {
        let mut closed = Vec::new();
        self.modals.retain_mut(|modal| {
            if modal.tick() == ClosePhase::ClosingCommitted {
                closed.push(modal.modal_id());
                false
            } else {
                true
            }
        });
        if !closed.is_empty() {
            tracing::debug!(closed = closed.len(), depth = self.modals.len(), "modals removed");
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::boundary::{FallbackAction, RenderError};
    use crate::modal::config::ModalConfig;
    use crate::modal::panel::PanelName;
    use panelkit_core::{KeyCode, KeyEvent, ManualClock, Overflow};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    type Content = fn(&PanelName) -> Result<String, RenderError>;

    fn content(panel: &PanelName) -> Result<String, RenderError> {
        Ok(panel.to_string())
    }

    fn shell(
        stack: &ModalStack,
        clock: &Rc<ManualClock>,
        closed: &Rc<Cell<u32>>,
    ) -> ModalShell<Content> {
        let closed = Rc::clone(closed);
        ModalShell::builder(content as Content)
            .clock(clock.clone())
            .scroll_lock(stack.scroll_lock())
            .on_close(move || closed.set(closed.get() + 1))
            .build()
    }

    fn escape() -> Event {
        Event::Key(KeyEvent::new(KeyCode::Escape))
    }

    #[test]
    fn events_reach_only_the_top() {
        let surface = Rc::new(Cell::new(Overflow::Visible));
        let mut stack = ModalStack::new(ScrollLock::new(Rc::clone(&surface)));
        let clock = Rc::new(ManualClock::new());
        let closed = Rc::new(Cell::new(0));

        let bottom = stack.push(Box::new(shell(&stack, &clock, &closed)));
        let top = stack.push(Box::new(shell(&stack, &clock, &closed)));
        assert_eq!(stack.top_id(), Some(top));
        assert_eq!(stack.ids(), vec![bottom, top]);

        assert_eq!(
            stack.handle_event(&escape()),
            ShellAction::CloseAttempted(CloseDecision::Approved)
        );
        assert!(stack.tick().is_empty(), "animation still running");

        clock.advance(Duration::from_millis(250));
        assert_eq!(stack.tick(), vec![top]);
        assert_eq!(closed.get(), 1);
        assert_eq!(stack.top_id(), Some(bottom));
        assert_eq!(surface.get(), Overflow::Hidden, "bottom modal still open");

        stack.close_top();
        clock.advance(Duration::from_millis(250));
        assert_eq!(stack.tick(), vec![bottom]);
        assert!(stack.is_empty());
        assert_eq!(surface.get(), Overflow::Visible);
    }

    #[test]
    fn open_mounts_on_the_stack_lock() {
        let surface = Rc::new(Cell::new(Overflow::Scroll));
        let mut stack = ModalStack::new(ScrollLock::new(Rc::clone(&surface)));
        let clock = Rc::new(ManualClock::new());

        let first = stack.open(ModalShell::builder(content as Content).clock(clock.clone()));
        let second = stack.open(ModalShell::builder(content as Content).clock(clock.clone()));
        assert_eq!(stack.ids(), vec![first, second]);
        assert_eq!(surface.get(), Overflow::Hidden);

        stack.pop();
        assert_eq!(surface.get(), Overflow::Hidden, "first modal still open");
        stack.pop();
        assert_eq!(surface.get(), Overflow::Scroll);
    }

    #[test]
    fn empty_stack_is_inert() {
        let mut stack = ModalStack::new(ScrollLock::new(Rc::new(Cell::new(Overflow::Auto))));
        assert_eq!(stack.handle_event(&escape()), ShellAction::Ignored);
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.close_top(), None);
        assert!(stack.tick().is_empty());
    }

    #[test]
    fn pop_id_removes_from_middle() {
        let surface = Rc::new(Cell::new(Overflow::Auto));
        let mut stack = ModalStack::new(ScrollLock::new(Rc::clone(&surface)));
        let clock = Rc::new(ManualClock::new());
        let closed = Rc::new(Cell::new(0));
        let a = stack.push(Box::new(shell(&stack, &clock, &closed)));
        let b = stack.push(Box::new(shell(&stack, &clock, &closed)));

        assert_eq!(stack.pop_id(a), Some(a));
        assert!(!stack.contains(a));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.pop_id(a), None);
        assert_eq!(stack.pop(), Some(b));
        assert_eq!(surface.get(), Overflow::Auto);
        assert_eq!(closed.get(), 0, "popping is not closing");
    }

    #[test]
    fn failed_boundary_ignores_events_until_closed() {
        let mut stack = ModalStack::new(ScrollLock::new(Rc::new(Cell::new(Overflow::Auto))));
        let clock = Rc::new(ManualClock::new());
        let closed = Rc::new(Cell::new(0));
        let sink = Rc::clone(&closed);
        let broken = ModalShell::builder(|_: &PanelName| {
            Err::<String, _>(RenderError::new("broken"))
        })
        .clock(clock.clone())
        .on_close(move || sink.set(sink.get() + 1))
        .build();

        let mut boundary = RenderFailureBoundary::new(broken)
            .with_config(&ModalConfig::default())
            .with_clock(clock.clone());
        assert!(boundary.render().fallback().is_some());
        assert!(boundary.activate(FallbackAction::Close));

        let id = stack.push(Box::new(boundary));
        assert_eq!(stack.handle_event(&escape()), ShellAction::Ignored);
        assert_eq!(stack.tick(), vec![id]);
        assert_eq!(closed.get(), 1);
    }
}
