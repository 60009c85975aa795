#![forbid(unsafe_code)]

//! Readiness tracking for asynchronous data dependencies.
//!
//! A modal often cannot show its form until some data has arrived: the record
//! being edited, option lists for selects, and so on. The data-fetch layer owns
//! those requests and exposes each one as a [`Dependency`]: an observable
//! [`DependencyState`] plus an optional retry hook. The [`ReadinessTracker`]
//! watches the *critical* dependencies and folds them, together with any
//! required identifiers, into a [`ReadinessSnapshot`].
//!
//! # Invariants
//!
//! 1. `is_ready` holds iff every critical dependency has succeeded and every
//!    required identifier is present. Optional dependencies never affect it.
//! 2. The snapshot is recomputed synchronously on every critical dependency
//!    change, in delivery order. There is no debouncing, so a snapshot never
//!    reports a stale "ready".
//! 3. [`ReadinessTracker::retry`] re-triggers failed critical dependencies
//!    only; pending, succeeded, and optional ones are left alone.
//!
//! # Example
//!
//! ```
//! use panelkit_widgets::modal::{Dependency, ReadinessTracker};
//!
//! let record = Dependency::new("budget");
//! let tracker = ReadinessTracker::builder()
//!     .critical(record.clone())
//!     .require("projectId", Some("p-1"))
//!     .build();
//!
//! assert!(tracker.snapshot().is_loading);
//! record.succeed();
//! assert!(tracker.snapshot().is_ready);
//! ```

use std::cell::Cell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use panelkit_runtime::reactive::{Observable, Subscription};

/// Failure payload carried by a failed dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyError {
    message: String,
}

impl DependencyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for DependencyError {}

/// Observable state of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DependencyState {
    #[default]
    Pending,
    Succeeded,
    Failed(DependencyError),
}

impl DependencyState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    #[must_use]
    pub fn error(&self) -> Option<&DependencyError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to a unit of asynchronous work owned by the data-fetch layer.
///
/// Clones share state: the fetch layer keeps one clone to report progress,
/// the tracker keeps another to observe it.
#[derive(Clone)]
pub struct Dependency {
    name: Rc<str>,
    state: Observable<DependencyState>,
    retry: Option<Rc<dyn Fn()>>,
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("retryable", &self.retry.is_some())
            .finish()
    }
}

impl Dependency {
    /// A pending dependency without a retry hook.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            state: Observable::new(DependencyState::Pending),
            retry: None,
        }
    }

    /// Attach the fetch layer's retry mechanism.
    #[must_use]
    pub fn with_retry(mut self, retry: impl Fn() + 'static) -> Self {
        self.retry = Some(Rc::new(retry));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> DependencyState {
        self.state.get()
    }

    pub fn set_state(&self, state: DependencyState) {
        self.state.set(state);
    }

    pub fn succeed(&self) {
        self.set_state(DependencyState::Succeeded);
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.set_state(DependencyState::Failed(DependencyError::new(message)));
    }

    pub fn mark_pending(&self) {
        self.set_state(DependencyState::Pending);
    }

    /// Invoke the retry hook. Returns `false` when there is none.
    pub fn retry(&self) -> bool {
        match &self.retry {
            Some(retry) => {
                retry();
                true
            }
            None => false,
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self, callback: impl Fn(&DependencyState) + 'static) -> Subscription {
        self.state.subscribe(callback)
    }
}

/// An identifier that must be non-empty for the modal to make sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredId {
    name: String,
    value: Option<String>,
}

impl RequiredId {
    pub fn new(name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Present means set and not blank.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

/// Why a snapshot is not ready because of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    MissingIdentifier { name: String },
    DependencyFailed { name: String, error: DependencyError },
}

impl fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentifier { name } => {
                write!(f, "missing required identifier `{name}`")
            }
            Self::DependencyFailed { name, error } => {
                write!(f, "dependency `{name}` failed: {error}")
            }
        }
    }
}

impl Error for ReadinessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingIdentifier { .. } => None,
            Self::DependencyFailed { error, .. } => Some(error),
        }
    }
}

/// Derived readiness verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadinessSnapshot {
    pub is_ready: bool,
    pub is_loading: bool,
    pub has_error: bool,
    pub first_error: Option<ReadinessError>,
}

impl ReadinessSnapshot {
    /// Snapshot for a modal with nothing to wait for.
    #[must_use]
    pub fn ready() -> Self {
        Self {
            is_ready: true,
            ..Self::default()
        }
    }
}

/// Fold dependency states and required identifiers into a snapshot.
///
/// Pure: depends only on the current states of its inputs. Missing
/// identifiers are reported before failed dependencies; within each group the
/// first in input order wins. Optional dependencies are accepted and ignored:
/// their state never affects the snapshot.
#[must_use]
pub fn evaluate(
    critical: &[Dependency],
    _optional: &[Dependency],
    required: &[RequiredId],
) -> ReadinessSnapshot {
    let mut first_error = required
        .iter()
        .find(|id| !id.is_present())
        .map(|id| ReadinessError::MissingIdentifier {
            name: id.name.clone(),
        });

    let mut is_loading = false;
    let mut all_succeeded = true;
    let mut any_failed = false;
    for dep in critical {
        dep.state.with(|state| match state {
            DependencyState::Pending => {
                is_loading = true;
                all_succeeded = false;
            }
            DependencyState::Succeeded => {}
            DependencyState::Failed(error) => {
                any_failed = true;
                all_succeeded = false;
                if first_error.is_none() {
                    first_error = Some(ReadinessError::DependencyFailed {
                        name: dep.name.to_string(),
                        error: error.clone(),
                    });
                }
            }
        });
    }

    let ids_present = required.iter().all(RequiredId::is_present);
    ReadinessSnapshot {
        is_ready: all_succeeded && ids_present,
        is_loading,
        has_error: any_failed || !ids_present,
        first_error,
    }
}

/// Builder for [`ReadinessTracker`].
#[derive(Debug, Default)]
pub struct ReadinessTrackerBuilder {
    critical: Vec<Dependency>,
    optional: Vec<Dependency>,
    required: Vec<RequiredId>,
}

impl ReadinessTrackerBuilder {
    #[must_use]
    pub fn critical(mut self, dep: Dependency) -> Self {
        self.critical.push(dep);
        self
    }

    #[must_use]
    pub fn optional(mut self, dep: Dependency) -> Self {
        self.optional.push(dep);
        self
    }

    /// Require `name` to carry a non-blank value.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.required.push(RequiredId::new(name, value));
        self
    }

    #[must_use]
    pub fn build(self) -> ReadinessTracker {
        ReadinessTracker::new(self.critical, self.optional, self.required)
    }
}

/// Live aggregation of dependency readiness.
///
/// Dropping the tracker unsubscribes from every dependency.
pub struct ReadinessTracker {
    critical: Rc<[Dependency]>,
    optional: Vec<Dependency>,
    required: Observable<Vec<RequiredId>>,
    snapshot: Observable<ReadinessSnapshot>,
    recomputations: Rc<Cell<u64>>,
    _subscriptions: Vec<Subscription>,
}

impl fmt::Debug for ReadinessTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessTracker")
            .field("critical", &self.critical)
            .field("optional", &self.optional)
            .field("required", &self.required.get())
            .field("snapshot", &self.snapshot.get())
            .finish()
    }
}

impl ReadinessTracker {
    #[must_use]
    pub fn builder() -> ReadinessTrackerBuilder {
        ReadinessTrackerBuilder::default()
    }

    #[must_use]
    pub fn new(
        critical: Vec<Dependency>,
        optional: Vec<Dependency>,
        required: Vec<RequiredId>,
    ) -> Self {
        let critical: Rc<[Dependency]> = critical.into();
        let initial = evaluate(&critical, &optional, &required);
        let required = Observable::new(required);
        let snapshot = Observable::new(initial);
        let recomputations = Rc::new(Cell::new(1));

        let recompute = {
            let critical = Rc::clone(&critical);
            let required = required.clone();
            let snapshot = snapshot.clone();
            let recomputations = Rc::clone(&recomputations);
            Rc::new(move || {
                let next = required.with(|ids| evaluate(&critical, &[], ids));
                recomputations.set(recomputations.get() + 1);
                if next != snapshot.get() {
                    tracing::debug!(
                        ready = next.is_ready,
                        loading = next.is_loading,
                        error = next.has_error,
                        "readiness changed"
                    );
                }
                snapshot.set(next);
            })
        };

        let mut subscriptions = Vec::with_capacity(critical.len() + 1);
        for dep in critical.iter() {
            let recompute = Rc::clone(&recompute);
            subscriptions.push(dep.subscribe(move |_| recompute()));
        }
        {
            let recompute = Rc::clone(&recompute);
            subscriptions.push(required.subscribe(move |_| recompute()));
        }

        Self {
            critical,
            optional,
            required,
            snapshot,
            recomputations,
            _subscriptions: subscriptions,
        }
    }

    /// Latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ReadinessSnapshot {
        self.snapshot.get()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.snapshot.with(|s| s.is_ready)
    }

    /// Observe snapshot changes.
    pub fn subscribe(&self, callback: impl Fn(&ReadinessSnapshot) + 'static) -> Subscription {
        self.snapshot.subscribe(callback)
    }

    /// Update (or add) a required identifier.
    pub fn set_required_id(&self, name: &str, value: Option<impl Into<String>>) {
        let value = value.map(Into::into);
        self.required.update(|ids| {
            match ids.iter_mut().find(|id| id.name == name) {
                Some(id) => id.value = value,
                None => ids.push(RequiredId {
                    name: name.to_owned(),
                    value,
                }),
            }
        });
    }

    /// Re-trigger every failed critical dependency. Returns how many were retried.
    pub fn retry(&self) -> usize {
        let failed: Vec<&Dependency> = self
            .critical
            .iter()
            .filter(|dep| dep.state.with(|s| s.error().is_some()))
            .collect();
        let mut retried = 0;
        for dep in failed {
            if dep.retry() {
                retried += 1;
            }
        }
        tracing::debug!(retried, "retrying failed critical dependencies");
        retried
    }

    #[must_use]
    pub fn critical(&self) -> &[Dependency] {
        &self.critical
    }

    #[must_use]
    pub fn optional(&self) -> &[Dependency] {
        &self.optional
    }

    /// How many times the snapshot has been computed (initial evaluation included).
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_dependencies_is_ready() {
        let tracker = ReadinessTracker::builder().build();
        assert_eq!(tracker.snapshot(), ReadinessSnapshot::ready());
    }

    #[test]
    fn missing_identifier_blocks_with_error() {
        let tracker = ReadinessTracker::builder()
            .require("projectId", None::<String>)
            .build();
        let snap = tracker.snapshot();
        assert!(!snap.is_ready);
        assert!(snap.has_error);
        assert!(!snap.is_loading);
        let message = snap.first_error.expect("error").to_string();
        assert!(message.contains("projectId"), "{message}");
    }

    #[test]
    fn blank_identifier_counts_as_missing() {
        let tracker = ReadinessTracker::builder().require("id", Some("  ")).build();
        assert!(tracker.snapshot().has_error);
    }

    #[test]
    fn pending_and_succeeded_is_loading() {
        let a = Dependency::new("a");
        let b = Dependency::new("b");
        b.succeed();
        let tracker = ReadinessTracker::builder()
            .critical(a.clone())
            .critical(b)
            .build();
        let snap = tracker.snapshot();
        assert!(snap.is_loading);
        assert!(!snap.is_ready);
        assert!(!snap.has_error);

        a.succeed();
        assert!(tracker.is_ready());
    }

    #[test]
    fn optional_failure_does_not_block() {
        let critical = Dependency::new("record");
        let optional = Dependency::new("history");
        let tracker = ReadinessTracker::builder()
            .critical(critical.clone())
            .optional(optional.clone())
            .build();

        optional.fail("timeout");
        critical.succeed();
        let snap = tracker.snapshot();
        assert!(snap.is_ready);
        assert!(!snap.has_error);
    }

    #[test]
    fn failure_reports_dependency_name() {
        let dep = Dependency::new("categories");
        let tracker = ReadinessTracker::builder().critical(dep.clone()).build();
        dep.fail("HTTP 500");
        let snap = tracker.snapshot();
        assert!(snap.has_error);
        assert_eq!(
            snap.first_error,
            Some(ReadinessError::DependencyFailed {
                name: "categories".into(),
                error: DependencyError::new("HTTP 500"),
            })
        );
    }

    #[test]
    fn missing_identifier_reported_before_failure() {
        let dep = Dependency::new("record");
        dep.fail("boom");
        let tracker = ReadinessTracker::builder()
            .critical(dep)
            .require("contactId", Some(""))
            .build();
        assert!(matches!(
            tracker.snapshot().first_error,
            Some(ReadinessError::MissingIdentifier { .. })
        ));
    }

    #[test]
    fn recompute_on_every_change() {
        let dep = Dependency::new("a");
        let tracker = ReadinessTracker::builder().critical(dep.clone()).build();
        assert_eq!(tracker.recomputations(), 1);
        dep.fail("x");
        dep.mark_pending();
        dep.succeed();
        assert_eq!(tracker.recomputations(), 4);
        assert!(tracker.is_ready());
    }

    #[test]
    fn retry_only_failed_critical() {
        let calls = Rc::new(Cell::new([0u32; 3]));
        let hook = |idx: usize| {
            let calls = Rc::clone(&calls);
            move || {
                let mut c = calls.get();
                c[idx] += 1;
                calls.set(c);
            }
        };
        let failed = Dependency::new("failed").with_retry(hook(0));
        let ok = Dependency::new("ok").with_retry(hook(1));
        let optional = Dependency::new("optional").with_retry(hook(2));
        failed.fail("nope");
        ok.succeed();
        optional.fail("nope");

        let tracker = ReadinessTracker::builder()
            .critical(failed)
            .critical(ok)
            .optional(optional)
            .build();
        assert_eq!(tracker.retry(), 1);
        assert_eq!(calls.get(), [1, 0, 0]);
    }

    #[test]
    fn set_required_id_recomputes() {
        let tracker = ReadinessTracker::builder()
            .require("projectId", None::<String>)
            .build();
        assert!(!tracker.is_ready());
        tracker.set_required_id("projectId", Some("p-1"));
        assert!(tracker.is_ready());
        tracker.set_required_id("budgetId", None::<String>);
        assert!(!tracker.is_ready());
    }

    #[test]
    fn snapshot_subscribers_see_latest() {
        let dep = Dependency::new("a");
        let tracker = ReadinessTracker::builder().critical(dep.clone()).build();
        let seen = Rc::new(Cell::new(false));
        let sink = Rc::clone(&seen);
        let _sub = tracker.subscribe(move |snap| sink.set(snap.is_ready));
        dep.succeed();
        assert!(seen.get());
    }

    #[test]
    fn dropping_tracker_unsubscribes() {
        let dep = Dependency::new("a");
        let tracker = ReadinessTracker::builder().critical(dep.clone()).build();
        assert_eq!(dep.state.subscriber_count(), 1);
        drop(tracker);
        assert_eq!(dep.state.subscriber_count(), 0);
    }
}
