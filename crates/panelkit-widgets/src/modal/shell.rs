#![forbid(unsafe_code)]

//! Modal shell: the composition of panels, readiness gating, focus trapping
//! and the close protocol for one open modal.
//!
//! The shell is headless. [`ModalShell::view`] describes what to draw as a
//! [`ShellView`]; the host draws it and feeds input back through
//! [`ModalShell::handle_event`].
//!
//! # Close protocol
//!
//! ```text
//! Open --approved--> ClosingStarted --delay elapsed (tick)--> ClosingCommitted
//! ```
//!
//! On commit the focus trap restores the prior focus, the background scroll
//! lock is released and the host's close callback fires. The callback fires
//! at most once per shell, whatever path led to the commit.
//!
//! # Host loop
//!
//! 1. `view()` and draw it.
//! 2. `after_render()` once the frame is on screen (applies initial focus).
//! 3. Forward input with `handle_event()`.
//! 4. Call `tick()` regularly while `is_closing()`.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use panelkit_core::{
    ClickEvent, Clock, ElementId, Event, FocusHost, HitRegion, KeyEvent, MouseButton, ScrollGuard,
    ScrollLock, SystemClock,
};
use panelkit_runtime::OneShotTimer;
use panelkit_runtime::reactive::{Binding, Subscription};

use super::boundary::{BoundaryTarget, RenderError};
use super::config::ModalConfig;
use super::focus_trap::{FocusRegion, FocusTrap, FocusTrapOptions, InitialFocus, TabOutcome};
use super::guard::{CloseDecision, CloseGuard, CloseTrigger, Confirm, PreventReason};
use super::keyboard::{KeyRoute, KeyboardRouter, RouteContext};
use super::panel::{PanelChangeHandler, PanelName, PanelStateMachine};
use super::readiness::ReadinessTracker;
use super::strings::ModalStrings;

/// Hit region tag for the modal backdrop.
pub const MODAL_HIT_BACKDROP: HitRegion = HitRegion::Custom(1);
/// Hit region tag for the modal content.
pub const MODAL_HIT_CONTENT: HitRegion = HitRegion::Custom(2);

static MODAL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a modal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalId(u64);

impl ModalId {
    fn next() -> Self {
        Self(MODAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modal-{}", self.0)
    }
}

/// Supplies the content of each named panel.
pub trait PanelContent {
    type Output;

    fn render(&self, panel: &PanelName) -> Result<Self::Output, RenderError>;
}

impl<F, O> PanelContent for F
where
    F: Fn(&PanelName) -> Result<O, RenderError>,
{
    type Output = O;

    fn render(&self, panel: &PanelName) -> Result<O, RenderError> {
        self(panel)
    }
}

/// Close protocol phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClosePhase {
    #[default]
    Open,
    /// Close approved; the exit animation is running.
    ClosingStarted,
    /// Close callback delivered; the shell is inert.
    ClosingCommitted,
}

/// What the shell did with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    /// Not for the modal; the host may handle it.
    Ignored,
    /// Swallowed without effect (e.g. a click inside the content).
    Consumed,
    CloseAttempted(CloseDecision),
    Submitted,
    Tab(TabOutcome),
}

impl ShellAction {
    /// Whether the host must stop propagating the event.
    #[must_use]
    pub fn is_handled(self) -> bool {
        match self {
            Self::Ignored => false,
            Self::Tab(outcome) => outcome.is_handled(),
            _ => true,
        }
    }
}

/// Accessibility attributes of the dialog element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogAttributes {
    pub role: &'static str,
    pub aria_modal: bool,
    pub id: String,
    pub labelled_by: String,
    pub described_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Enter,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub title: String,
    pub title_id: String,
    pub description: Option<String>,
    pub description_id: Option<String>,
    pub panel: PanelName,
    pub close_label: String,
}

/// Body region: gating view or the active panel's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView<T> {
    Loading {
        label: String,
    },
    DependencyError {
        title: String,
        message: String,
        retry_label: String,
    },
    Panel {
        name: PanelName,
        content: T,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterView {
    /// Present when a submit handler is registered.
    pub submit_label: Option<String>,
    pub submit_enabled: bool,
    pub close_label: String,
}

/// Everything the host needs to draw one frame of the modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView<T> {
    pub dialog: DialogAttributes,
    pub animation: Animation,
    pub header: HeaderView,
    pub unsaved_banner: Option<String>,
    pub body: BodyView<T>,
    pub footer: FooterView,
}

impl<T> ShellView<T> {
    /// Panel content, if the body is not gated.
    #[must_use]
    pub fn content(&self) -> Option<&T> {
        match &self.body {
            BodyView::Panel { content, .. } => Some(content),
            _ => None,
        }
    }
}

/// Builder for [`ModalShell`].
pub struct ModalShellBuilder<C> {
    content: C,
    title: String,
    description: Option<String>,
    initial_panel: PanelName,
    forced_panel: Option<PanelName>,
    on_panel_change: Option<PanelChangeHandler>,
    config: ModalConfig,
    strings: ModalStrings,
    guard: CloseGuard,
    on_submit: Option<Rc<dyn Fn()>>,
    on_close: Option<Box<dyn FnOnce()>>,
    readiness: Option<ReadinessTracker>,
    focus: Option<(Rc<dyn FocusHost>, FocusRegion)>,
    initial_focus_target: Option<ElementId>,
    clock: Rc<dyn Clock>,
    scroll_lock: Option<ScrollLock>,
}

impl<C: PanelContent> ModalShellBuilder<C> {
    pub fn new(content: C) -> Self {
        Self {
            content,
            title: String::new(),
            description: None,
            initial_panel: PanelName::View,
            forced_panel: None,
            on_panel_change: None,
            config: ModalConfig::default(),
            strings: ModalStrings::default(),
            guard: CloseGuard::new(String::new()),
            on_submit: None,
            on_close: None,
            readiness: None,
            focus: None,
            initial_focus_target: None,
            clock: Rc::new(SystemClock),
            scroll_lock: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn initial_panel(mut self, panel: PanelName) -> Self {
        self.initial_panel = panel;
        self
    }

    /// Pin the active panel regardless of internal transitions.
    #[must_use]
    pub fn forced_panel(mut self, panel: Option<PanelName>) -> Self {
        self.forced_panel = panel;
        self
    }

    #[must_use]
    pub fn on_panel_change(mut self, handler: impl Fn(&PanelName) + 'static) -> Self {
        self.on_panel_change = Some(Rc::new(handler));
        self
    }

    #[must_use]
    pub fn config(mut self, config: ModalConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn strings(mut self, strings: ModalStrings) -> Self {
        self.strings = strings;
        self
    }

    #[must_use]
    pub fn can_close(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.guard = self.guard.can_close(predicate);
        self
    }

    /// Unsaved-changes flag: a constant or a live [`Binding`].
    #[must_use]
    pub fn has_unsaved_changes(mut self, flag: impl Into<Binding<bool>>) -> Self {
        self.guard = self.guard.unsaved_changes(flag);
        self
    }

    /// Confirmation provider for the unsaved-changes prompt.
    #[must_use]
    pub fn confirm_with(mut self, confirm: impl Confirm + 'static) -> Self {
        self.guard = self.guard.confirm_with(confirm);
        self
    }

    /// Called with the trigger and reason whenever a close attempt is denied.
    #[must_use]
    pub fn on_close_prevented(
        mut self,
        handler: impl Fn(CloseTrigger, PreventReason) + 'static,
    ) -> Self {
        self.guard = self.guard.on_prevented(handler);
        self
    }

    #[must_use]
    pub fn on_submit(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_submit = Some(Rc::new(handler));
        self
    }

    #[must_use]
    pub fn on_close(mut self, handler: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn readiness(mut self, tracker: ReadinessTracker) -> Self {
        self.readiness = Some(tracker);
        self
    }

    /// Enable focus management over `region` using the host's focus system.
    #[must_use]
    pub fn focus(mut self, host: Rc<dyn FocusHost>, region: FocusRegion) -> Self {
        self.focus = Some((host, region));
        self
    }

    #[must_use]
    pub fn initial_focus_target(mut self, target: impl Into<ElementId>) -> Self {
        self.initial_focus_target = Some(target.into());
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn scroll_lock(mut self, lock: ScrollLock) -> Self {
        self.scroll_lock = Some(lock);
        self
    }

    /// Mount the modal.
    ///
    /// Locks background scroll and snapshots the current focus.
    pub fn build(self) -> ModalShell<C> {
        let id = ModalId::next();

        let mut panels = PanelStateMachine::new(self.initial_panel).with_forced(self.forced_panel);
        if let Some(handler) = self.on_panel_change {
            panels = panels.on_change(move |name| handler(name));
        }

        let guard = self
            .guard
            .with_message(self.config.unsaved_changes_message.clone());

        let gate_open = Rc::new(Cell::new(
            self.readiness
                .as_ref()
                .is_none_or(ReadinessTracker::is_ready),
        ));
        let gate_subscription = self.readiness.as_ref().map(|tracker| {
            let gate_open = Rc::clone(&gate_open);
            tracker.subscribe(move |snapshot| {
                if snapshot.is_ready && !gate_open.get() {
                    gate_open.set(true);
                    tracing::debug!("readiness gate lifted");
                }
            })
        });

        let initial = self
            .initial_focus_target
            .map(InitialFocus::Target)
            .or(self
                .config
                .auto_focus_first_input
                .then_some(InitialFocus::FirstInput));
        let options = FocusTrapOptions {
            trap: self.config.trap_focus,
            initial,
            restore: self.config.restore_focus,
        };
        let focus = self.focus.map(|(host, region)| {
            let mut trap = FocusTrap::new(host, region, options);
            trap.activate();
            trap
        });

        let scroll_guard = self.scroll_lock.as_ref().map(ScrollLock::acquire);
        let router = KeyboardRouter::new(!self.config.prevent_escape_close, self.config.trap_focus);

        tracing::debug!(modal = id.get(), panel = %panels.active(), "modal mounted");

        ModalShell {
            id,
            title: self.title,
            description: self.description,
            content: self.content,
            panels,
            readiness: self.readiness,
            gate_open,
            _gate_subscription: gate_subscription,
            guard,
            router,
            focus,
            phase: ClosePhase::Open,
            close_timer: OneShotTimer::new(),
            clock: self.clock,
            on_submit: self.on_submit,
            on_close: self.on_close,
            scroll_guard,
            config: self.config,
            strings: self.strings,
        }
    }
}

/// One mounted modal.
pub struct ModalShell<C> {
    id: ModalId,
    title: String,
    description: Option<String>,
    content: C,
    panels: PanelStateMachine,
    readiness: Option<ReadinessTracker>,
    gate_open: Rc<Cell<bool>>,
    _gate_subscription: Option<Subscription>,
    guard: CloseGuard,
    router: KeyboardRouter,
    focus: Option<FocusTrap>,
    phase: ClosePhase,
    close_timer: OneShotTimer,
    clock: Rc<dyn Clock>,
    on_submit: Option<Rc<dyn Fn()>>,
    on_close: Option<Box<dyn FnOnce()>>,
    scroll_guard: Option<ScrollGuard>,
    config: ModalConfig,
    strings: ModalStrings,
}

impl<C> fmt::Debug for ModalShell<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalShell")
            .field("id", &self.id)
            .field("panel", &self.panels.active())
            .field("phase", &self.phase)
            .field("gate_open", &self.gate_open.get())
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}

impl<C: PanelContent> ModalShell<C> {
    pub fn builder(content: C) -> ModalShellBuilder<C> {
        ModalShellBuilder::new(content)
    }

    #[must_use]
    pub fn id(&self) -> ModalId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> ClosePhase {
        self.phase
    }

    /// Whether a close has been approved (animating or committed).
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.phase != ClosePhase::Open
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.phase == ClosePhase::ClosingCommitted
    }

    #[must_use]
    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    #[must_use]
    pub fn guard(&self) -> &CloseGuard {
        &self.guard
    }

    #[must_use]
    pub fn readiness(&self) -> Option<&ReadinessTracker> {
        self.readiness.as_ref()
    }

    #[must_use]
    pub fn focus_trap(&self) -> Option<&FocusTrap> {
        self.focus.as_ref()
    }

    #[must_use]
    pub fn panels(&self) -> &PanelStateMachine {
        &self.panels
    }

    /// Mutable access for host-driven overrides such as `force_panel`.
    pub fn panels_mut(&mut self) -> &mut PanelStateMachine {
        &mut self.panels
    }

    #[must_use]
    pub fn active_panel(&self) -> PanelName {
        self.panels.active()
    }

    pub fn set_panel(&mut self, name: PanelName) {
        self.panels.set_panel(name);
    }

    /// Whether the body is replaced by the loading/error view.
    ///
    /// Once readiness has been observed the gate stays open for the lifetime
    /// of the shell.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        if self.gate_open.get() {
            return false;
        }
        match &self.readiness {
            Some(tracker) if !tracker.is_ready() => true,
            _ => {
                self.gate_open.set(true);
                false
            }
        }
    }

    fn can_submit(&self) -> bool {
        self.phase == ClosePhase::Open
            && !self.is_gated()
            && self.readiness.as_ref().is_none_or(ReadinessTracker::is_ready)
    }

    /// Describe the current frame.
    ///
    /// Fails only if the panel content provider fails.
    pub fn view(&self) -> Result<ShellView<C::Output>, RenderError> {
        let body = match self.gate_body() {
            Some(body) => body,
            None => {
                let name = self.panels.active();
                let content = self.content.render(&name)?;
                BodyView::Panel { name, content }
            }
        };

        let title_id = format!("{}-title", self.id);
        let description_id = self
            .description
            .as_ref()
            .map(|_| format!("{}-description", self.id));

        Ok(ShellView {
            dialog: DialogAttributes {
                role: "dialog",
                aria_modal: true,
                id: self.id.to_string(),
                labelled_by: title_id.clone(),
                described_by: description_id.clone(),
            },
            animation: if self.is_closing() {
                Animation::Exit
            } else {
                Animation::Enter
            },
            header: HeaderView {
                title: self.title.clone(),
                title_id,
                description: self.description.clone(),
                description_id,
                panel: self.panels.active(),
                close_label: self.strings.close.to_string(),
            },
            unsaved_banner: self
                .guard
                .has_unsaved_changes()
                .then(|| self.strings.unsaved_banner.to_string()),
            body,
            footer: FooterView {
                submit_label: self
                    .on_submit
                    .as_ref()
                    .map(|_| self.strings.submit.to_string()),
                submit_enabled: self.on_submit.is_some() && self.can_submit(),
                close_label: self.strings.close.to_string(),
            },
        })
    }

    fn gate_body<T>(&self) -> Option<BodyView<T>> {
        if !self.is_gated() {
            return None;
        }
        let snapshot = self.readiness.as_ref()?.snapshot();
        if snapshot.has_error {
            Some(BodyView::DependencyError {
                title: self.strings.dependency_error_title.to_string(),
                message: snapshot
                    .first_error
                    .map(|err| err.to_string())
                    .unwrap_or_default(),
                retry_label: self.strings.retry.to_string(),
            })
        } else {
            Some(BodyView::Loading {
                label: self.strings.loading.to_string(),
            })
        }
    }

    /// Signal that the last view has been drawn.
    ///
    /// Applies the initial focus the first time panel content is on screen.
    pub fn after_render(&mut self) -> Option<ElementId> {
        if self.is_closing() || self.is_gated() {
            return None;
        }
        self.focus.as_mut()?.settle()
    }

    /// Route an input event.
    pub fn handle_event(&mut self, event: &Event) -> ShellAction {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Click(click) => self.handle_click(click),
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> ShellAction {
        let ctx = RouteContext {
            focused_kind: self.focus.as_ref().and_then(FocusTrap::focused_kind),
            ready: self.can_submit(),
            has_submit: self.on_submit.is_some(),
        };
        match self.router.route(key, &ctx) {
            KeyRoute::AttemptClose(trigger) => ShellAction::CloseAttempted(self.attempt_close(trigger)),
            KeyRoute::Submit => {
                if self.submit() {
                    ShellAction::Submitted
                } else {
                    ShellAction::Ignored
                }
            }
            KeyRoute::Tab { backward } => match self.focus.as_mut() {
                Some(trap) => ShellAction::Tab(trap.handle_tab(backward)),
                None => ShellAction::Ignored,
            },
            KeyRoute::PassThrough => ShellAction::Ignored,
        }
    }

    /// Route a click already resolved to a hit region.
    ///
    /// Clicks inside the content are consumed so they never count as
    /// backdrop clicks.
    pub fn handle_click(&mut self, click: &ClickEvent) -> ShellAction {
        if click.button != MouseButton::Left {
            return ShellAction::Ignored;
        }
        match click.region {
            MODAL_HIT_BACKDROP if !self.config.prevent_backdrop_close => {
                ShellAction::CloseAttempted(self.attempt_close(CloseTrigger::Backdrop))
            }
            MODAL_HIT_BACKDROP | MODAL_HIT_CONTENT => ShellAction::Consumed,
            _ => ShellAction::Ignored,
        }
    }

    /// Close button.
    pub fn request_close(&mut self) -> CloseDecision {
        self.attempt_close(CloseTrigger::Button)
    }

    /// Run the close guard and, if approved, start the close sequence.
    pub fn attempt_close(&mut self, trigger: CloseTrigger) -> CloseDecision {
        if self.is_closing() {
            tracing::debug!(modal = self.id.get(), %trigger, "close already in progress");
            return CloseDecision::AlreadyClosing;
        }
        let decision = self.guard.evaluate(trigger);
        if decision.is_approved() {
            self.begin_close();
        }
        decision
    }

    fn begin_close(&mut self) {
        self.panels.reset();
        self.phase = ClosePhase::ClosingStarted;
        let delay = self.config.effective_close_delay();
        tracing::debug!(modal = self.id.get(), ?delay, "closing started");
        if delay.is_zero() {
            self.commit();
        } else {
            self.close_timer.arm(self.clock.now(), delay);
        }
    }

    fn commit(&mut self) {
        if self.phase == ClosePhase::ClosingCommitted {
            return;
        }
        self.phase = ClosePhase::ClosingCommitted;
        self.close_timer.cancel();
        if let Some(trap) = self.focus.as_mut() {
            trap.deactivate();
        }
        self.scroll_guard = None;
        self._gate_subscription = None;
        tracing::debug!(modal = self.id.get(), "close committed");
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }

    /// Advance the close animation. Returns the phase after the update.
    pub fn tick(&mut self) -> ClosePhase {
        if self.phase == ClosePhase::ClosingStarted && self.close_timer.poll(self.clock.now()) {
            self.commit();
        }
        self.phase
    }

    /// Close immediately without consulting the guard.
    pub fn dismiss(&mut self) {
        if self.is_closed() {
            return;
        }
        tracing::debug!(modal = self.id.get(), "modal dismissed");
        self.panels.reset();
        self.commit();
    }

    /// Invoke the submit handler if the modal is ready. Returns whether it ran.
    pub fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        match &self.on_submit {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Re-trigger failed critical dependencies.
    pub fn retry_dependencies(&self) -> usize {
        self.readiness.as_ref().map_or(0, ReadinessTracker::retry)
    }
}

impl<C: PanelContent> BoundaryTarget for ModalShell<C> {
    type Output = ShellView<C::Output>;

    fn render(&mut self) -> Result<Self::Output, RenderError> {
        self.view()
    }

    fn force_close(&mut self) {
        self.dismiss();
    }
}
