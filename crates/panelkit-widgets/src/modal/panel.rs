#![forbid(unsafe_code)]

//! Panel state machine.
//!
//! Tracks which named panel (view, edit, sub-form, or a host-defined one) a
//! modal currently shows. Transitions are unconditional: whether leaving a
//! panel is allowed is decided by the host's UI or, for closes, by the close
//! guard.
//!
//! A host may force a panel. While forced, the forced panel is what
//! [`PanelStateMachine::active`] reports regardless of internal transitions;
//! internal transitions are still recorded and take effect once the force is
//! lifted.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use panelkit_runtime::reactive::{Observable, Subscription};

/// Name of a mutually exclusive content mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PanelName {
    View,
    Edit,
    Subform,
    /// Host-defined panel.
    Custom(Cow<'static, str>),
}

impl PanelName {
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Subform => "subform",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for PanelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for PanelName {
    fn from(name: &str) -> Self {
        match name {
            "view" => Self::View,
            "edit" => Self::Edit,
            "subform" => Self::Subform,
            other => Self::Custom(Cow::Owned(other.to_owned())),
        }
    }
}

/// Per-instance panel state.
pub struct PanelStateMachine {
    initial: PanelName,
    requested: PanelName,
    forced: Option<PanelName>,
    active: Observable<PanelName>,
    _on_change: Option<Subscription>,
}

impl fmt::Debug for PanelStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelStateMachine")
            .field("initial", &self.initial)
            .field("requested", &self.requested)
            .field("forced", &self.forced)
            .field("active", &self.active.get())
            .finish()
    }
}

impl PanelStateMachine {
    #[must_use]
    pub fn new(initial: PanelName) -> Self {
        Self {
            active: Observable::new(initial.clone()),
            requested: initial.clone(),
            initial,
            forced: None,
            _on_change: None,
        }
    }

    /// Start with a forced panel already applied.
    #[must_use]
    pub fn with_forced(mut self, forced: Option<PanelName>) -> Self {
        self.forced = forced;
        self.sync();
        self
    }

    /// Invoke `callback` whenever the active panel changes.
    #[must_use]
    pub fn on_change(mut self, callback: impl Fn(&PanelName) + 'static) -> Self {
        self._on_change = Some(self.active.subscribe(callback));
        self
    }

    /// The panel currently shown.
    #[must_use]
    pub fn active(&self) -> PanelName {
        self.active.get()
    }

    #[must_use]
    pub fn is_active(&self, name: &PanelName) -> bool {
        self.active.with(|active| active == name)
    }

    #[must_use]
    pub fn initial(&self) -> &PanelName {
        &self.initial
    }

    #[must_use]
    pub fn forced(&self) -> Option<&PanelName> {
        self.forced.as_ref()
    }

    /// Switch to `name`. No-op if already requested.
    pub fn set_panel(&mut self, name: PanelName) {
        if self.requested == name {
            return;
        }
        tracing::debug!(from = %self.requested, to = %name, "panel transition");
        self.requested = name;
        self.sync();
    }

    /// Force (or stop forcing) a panel from outside.
    pub fn force_panel(&mut self, forced: Option<PanelName>) {
        if self.forced == forced {
            return;
        }
        self.forced = forced;
        self.sync();
    }

    /// Return to the initial panel.
    pub fn reset(&mut self) {
        self.requested = self.initial.clone();
        self.sync();
    }

    /// Subscribe to active-panel changes.
    pub fn subscribe(&self, callback: impl Fn(&PanelName) + 'static) -> Subscription {
        self.active.subscribe(callback)
    }

    /// Shared handle to the active panel, for hosts that bind to it.
    #[must_use]
    pub fn observable(&self) -> Observable<PanelName> {
        self.active.clone()
    }

    fn sync(&self) {
        let effective = self.forced.as_ref().unwrap_or(&self.requested).clone();
        self.active.set(effective);
    }
}

/// Callback invoked with the new panel name.
pub type PanelChangeHandler = Rc<dyn Fn(&PanelName)>;
