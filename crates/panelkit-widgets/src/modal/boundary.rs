#![forbid(unsafe_code)]

//! Render failure boundary.
//!
//! Wraps anything that produces a modal's visible output and guarantees that
//! a failure while producing it never reaches the host. Content providers
//! report failures as `Err(RenderError)`; panics raised while rendering are
//! caught and converted to the same error.
//!
//! # State machine
//!
//! ```text
//! Healthy --failure--> Failed --retry--> Healthy
//!                        |
//!                        +--(count >= max)--> Exhausted
//! ```
//!
//! - While `Failed`, the fallback offers *retry* and *close*.
//! - While `Exhausted`, only *force close* remains.
//! - A successful render at least one cooldown after the last failure resets
//!   the retry counter.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use panelkit_core::{Clock, Instant, SystemClock};

use super::config::ModalConfig;
use super::strings::ModalStrings;

/// Failure raised while producing modal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    message: String,
    detail: Option<String>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    /// Attach technical detail shown only when error details are enabled.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Convert a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::new("content panicked while rendering").with_detail(message)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for RenderError {}

/// Something the boundary can render and, as a last resort, close.
pub trait BoundaryTarget {
    type Output;

    /// Produce the visible output.
    fn render(&mut self) -> Result<Self::Output, RenderError>;

    /// Close immediately, bypassing any close guard.
    fn force_close(&mut self);
}

/// Bounded failure counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    count: u32,
    max: u32,
}

impl RetryBudget {
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.count)
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.count >= self.max
    }

    /// Record one failure and return the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(ModalConfig::DEFAULT_MAX_RETRIES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryState {
    #[default]
    Healthy,
    Failed,
    Exhausted,
}

/// Affordances offered by the fallback view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackAction {
    Retry,
    Close,
    ForceClose,
}

impl FallbackAction {
    #[must_use]
    pub fn label(self, strings: &ModalStrings) -> &str {
        match self {
            Self::Retry => &strings.retry,
            Self::Close => &strings.close,
            Self::ForceClose => &strings.force_close,
        }
    }
}

/// Minimal replacement for the whole modal after a render failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackView {
    pub title: String,
    pub description: String,
    /// Technical detail, present only when error details are enabled.
    pub detail: Option<String>,
    pub actions: Vec<FallbackAction>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl FallbackView {
    #[must_use]
    pub fn offers(&self, action: FallbackAction) -> bool {
        self.actions.contains(&action)
    }
}

/// Output of [`RenderFailureBoundary::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryView<T> {
    Content(T),
    Fallback(FallbackView),
}

impl<T> BoundaryView<T> {
    #[must_use]
    pub fn content(&self) -> Option<&T> {
        match self {
            Self::Content(content) => Some(content),
            Self::Fallback(_) => None,
        }
    }

    #[must_use]
    pub fn fallback(&self) -> Option<&FallbackView> {
        match self {
            Self::Content(_) => None,
            Self::Fallback(view) => Some(view),
        }
    }
}

/// Catches render failures of a [`BoundaryTarget`] and offers bounded retry.
pub struct RenderFailureBoundary<T> {
    target: T,
    budget: RetryBudget,
    state: BoundaryState,
    last_error: Option<RenderError>,
    last_failure_at: Option<Instant>,
    /// A render succeeded since `last_failure_at`.
    recovered: bool,
    cooldown: Duration,
    show_details: bool,
    strings: ModalStrings,
    clock: Rc<dyn Clock>,
}

impl<T: fmt::Debug> fmt::Debug for RenderFailureBoundary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderFailureBoundary")
            .field("target", &self.target)
            .field("budget", &self.budget)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<T: BoundaryTarget> RenderFailureBoundary<T> {
    /// Boundary with default budget (3), cooldown (30s) and the system clock.
    pub fn new(target: T) -> Self {
        let config = ModalConfig::default();
        Self {
            target,
            budget: RetryBudget::new(config.max_retries),
            state: BoundaryState::Healthy,
            last_error: None,
            last_failure_at: None,
            recovered: false,
            cooldown: config.retry_cooldown,
            show_details: config.show_error_details,
            strings: ModalStrings::default(),
            clock: Rc::new(SystemClock),
        }
    }

    /// Take budget, cooldown and detail visibility from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &ModalConfig) -> Self {
        self.budget = RetryBudget::new(config.max_retries);
        self.cooldown = config.retry_cooldown;
        self.show_details = config.show_error_details;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_strings(mut self, strings: ModalStrings) -> Self {
        self.strings = strings;
        self
    }

    /// Render the target, or the fallback while failed.
    ///
    /// The target is not called again until the user retries.
    pub fn render(&mut self) -> BoundaryView<T::Output> {
        if self.state != BoundaryState::Healthy {
            return BoundaryView::Fallback(self.fallback_view());
        }

        let target = &mut self.target;
        let result = panic::catch_unwind(AssertUnwindSafe(|| target.render()))
            .unwrap_or_else(|payload| Err(RenderError::from_panic(payload)));

        match result {
            Ok(output) => {
                self.recovered = self.last_failure_at.is_some();
                self.expire_cooldown();
                BoundaryView::Content(output)
            }
            Err(err) => {
                self.record_failure(err);
                BoundaryView::Fallback(self.fallback_view())
            }
        }
    }

    /// Perform a fallback action. Returns `false` if the action is not
    /// currently offered.
    pub fn activate(&mut self, action: FallbackAction) -> bool {
        match (action, self.state) {
            (FallbackAction::Retry, BoundaryState::Failed) => {
                tracing::debug!(retry_count = self.budget.count(), "retrying render");
                self.state = BoundaryState::Healthy;
                self.last_error = None;
                true
            }
            (FallbackAction::Close, BoundaryState::Failed)
            | (FallbackAction::ForceClose, BoundaryState::Exhausted) => {
                self.target.force_close();
                true
            }
            _ => false,
        }
    }

    fn record_failure(&mut self, err: RenderError) {
        self.expire_cooldown();
        let count = self.budget.record_failure();
        self.last_failure_at = Some(self.clock.now());
        self.recovered = false;
        if self.budget.is_exhausted() {
            self.state = BoundaryState::Exhausted;
            tracing::warn!(retry_count = count, max = self.budget.max(), error = %err, "render retries exhausted");
        } else {
            self.state = BoundaryState::Failed;
            tracing::warn!(retry_count = count, max = self.budget.max(), error = %err, "render failure caught");
        }
        self.last_error = Some(err);
    }

    /// Clears the counter once a render has succeeded since the last failure
    /// and a full cooldown has passed since that failure. Runs on success and
    /// before counting a new failure.
    fn expire_cooldown(&mut self) {
        let Some(at) = self.last_failure_at else {
            return;
        };
        if self.recovered && self.clock.now().saturating_duration_since(at) >= self.cooldown {
            tracing::debug!(cleared = self.budget.count(), "render retry counter reset");
            self.budget.reset();
            self.last_failure_at = None;
            self.recovered = false;
        }
    }

    fn fallback_view(&self) -> FallbackView {
        let exhausted = self.state == BoundaryState::Exhausted;
        let description = if exhausted {
            self.strings.retries_exhausted.to_string()
        } else {
            self.strings.render_error_description.to_string()
        };
        let detail = self
            .last_error
            .as_ref()
            .filter(|_| self.show_details)
            .map(ToString::to_string);
        let actions = if exhausted {
            vec![FallbackAction::ForceClose]
        } else {
            vec![FallbackAction::Retry, FallbackAction::Close]
        };
        FallbackView {
            title: self.strings.render_error_title.to_string(),
            description,
            detail,
            actions,
            retry_count: self.budget.count(),
            max_retries: self.budget.max(),
        }
    }

    #[must_use]
    pub fn state(&self) -> BoundaryState {
        self.state
    }

    #[must_use]
    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&RenderError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn strings(&self) -> &ModalStrings {
        &self.strings
    }

    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_inner(self) -> T {
        self.target
    }
}
