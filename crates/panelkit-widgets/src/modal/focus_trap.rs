#![forbid(unsafe_code)]

//! Focus trap for open modals.
//!
//! - **Region**: the host publishes the modal's elements through a
//!   [`FocusRegion`]. Every publish counts as a structural change.
//! - **Focusable set**: recomputed from the region on each structural change
//!   while the trap is active. No polling.
//! - **Wrap-around**: Tab on the last focusable element moves to the first;
//!   Shift+Tab on the first moves to the last. Other tab presses pass through.
//! - **Restore**: on deactivation focus returns to whatever held it when the
//!   trap activated, if that element still exists.
//!
//! # Failure Modes
//!
//! - Empty focusable set: Tab is blocked so focus cannot leave the modal.
//! - Focus outside the set (e.g. still on the opener): Tab moves to the first
//!   element, Shift+Tab to the last.
//! - Restore target detached: nothing happens.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashSet;
use panelkit_core::{Element, ElementId, ElementKind, FocusHost};
use panelkit_runtime::reactive::{Observable, Subscription};

/// Published element list of a modal's visible region.
///
/// Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct FocusRegion {
    elements: Observable<Vec<Element>>,
}

impl FocusRegion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self {
            elements: Observable::new(elements),
        }
    }

    /// Replace the whole list (e.g. after a panel switch).
    pub fn set_elements(&self, elements: Vec<Element>) {
        self.elements.set(elements);
    }

    pub fn push(&self, element: Element) {
        self.elements.update(|els| els.push(element));
    }

    pub fn remove(&self, id: ElementId) {
        self.elements.update(|els| els.retain(|el| el.id != id));
    }

    pub fn set_visible(&self, id: ElementId, visible: bool) {
        self.modify(id, |el| el.visible = visible);
    }

    pub fn set_disabled(&self, id: ElementId, disabled: bool) {
        self.modify(id, |el| el.disabled = disabled);
    }

    #[must_use]
    pub fn elements(&self) -> Vec<Element> {
        self.elements.get()
    }

    #[must_use]
    pub fn kind_of(&self, id: ElementId) -> Option<ElementKind> {
        self.elements
            .with(|els| els.iter().find(|el| el.id == id).map(|el| el.kind))
    }

    /// Observe structural changes.
    pub fn subscribe(&self, callback: impl Fn(&Vec<Element>) + 'static) -> Subscription {
        self.elements.subscribe(callback)
    }

    fn modify(&self, id: ElementId, f: impl Fn(&mut Element)) {
        self.elements.update(|els| {
            if let Some(el) = els.iter_mut().find(|el| el.id == id) {
                f(el);
            }
        });
    }
}

/// Ordered focusable elements of a region, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusableSet {
    entries: Vec<(ElementId, ElementKind)>,
}

impl FocusableSet {
    /// Filter `elements` down to the focusable ones. Duplicate ids keep their
    /// first occurrence.
    #[must_use]
    pub fn collect(elements: &[Element]) -> Self {
        let mut seen = AHashSet::with_capacity(elements.len());
        let entries = elements
            .iter()
            .filter(|el| el.is_focusable())
            .filter(|el| seen.insert(el.id))
            .map(|el| (el.id, el.kind))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<ElementId> {
        self.entries.first().map(|(id, _)| *id)
    }

    #[must_use]
    pub fn last(&self) -> Option<ElementId> {
        self.entries.last().map(|(id, _)| *id)
    }

    #[must_use]
    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.entries.iter().position(|(eid, _)| *eid == id)
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// First text, number, or selection input.
    #[must_use]
    pub fn first_data_entry(&self) -> Option<ElementId> {
        self.entries
            .iter()
            .find(|(_, kind)| kind.is_data_entry())
            .map(|(id, _)| *id)
    }
}

/// Where focus goes once content has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialFocus {
    /// An explicit element.
    Target(ElementId),
    /// The first data-entry input, falling back to the first focusable element.
    FirstInput,
}

/// Result of routing a tab press through the trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabOutcome {
    /// Not handled; the host moves focus normally.
    PassThrough,
    /// Focus wrapped around an end of the set.
    Wrapped(ElementId),
    /// Focus was outside the set and was pulled back in.
    Redirected(ElementId),
    /// Nothing focusable; the tab press is swallowed.
    Blocked,
}

impl TabOutcome {
    /// Whether the host must suppress its default tab handling.
    #[must_use]
    pub fn is_handled(self) -> bool {
        !matches!(self, Self::PassThrough)
    }
}

/// Focus trap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTrapOptions {
    /// Constrain tab cycling to the region.
    pub trap: bool,
    pub initial: Option<InitialFocus>,
    /// Restore the pre-activation focus on deactivation.
    pub restore: bool,
}

impl Default for FocusTrapOptions {
    fn default() -> Self {
        Self {
            trap: true,
            initial: None,
            restore: true,
        }
    }
}

/// Keeps keyboard focus inside a modal while it is open.
pub struct FocusTrap {
    host: Rc<dyn FocusHost>,
    region: FocusRegion,
    options: FocusTrapOptions,
    set: Rc<RefCell<FocusableSet>>,
    previous: Option<ElementId>,
    pending_initial: Option<InitialFocus>,
    active: bool,
    observer: Option<Subscription>,
}

impl fmt::Debug for FocusTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusTrap")
            .field("options", &self.options)
            .field("set", &self.set.borrow())
            .field("previous", &self.previous)
            .field("pending_initial", &self.pending_initial)
            .field("active", &self.active)
            .finish()
    }
}

impl FocusTrap {
    pub fn new(host: Rc<dyn FocusHost>, region: FocusRegion, options: FocusTrapOptions) -> Self {
        Self {
            host,
            region,
            options,
            set: Rc::new(RefCell::new(FocusableSet::default())),
            previous: None,
            pending_initial: None,
            active: false,
            observer: None,
        }
    }

    /// Snapshot the current focus and start observing the region.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.previous = self.host.active_element();
        self.pending_initial = self.options.initial;

        let set = Rc::clone(&self.set);
        self.observer = Some(self.region.subscribe(move |elements| {
            let next = FocusableSet::collect(elements);
            tracing::debug!(focusable = next.len(), "focusable set recomputed");
            *set.borrow_mut() = next;
        }));
        *self.set.borrow_mut() = self.region.elements.with(|els| FocusableSet::collect(els));
        self.active = true;
        tracing::debug!(previous = ?self.previous, "focus trap activated");
    }

    /// Apply the pending initial focus, once. Call after content has rendered.
    ///
    /// Returns the element that received focus, if any.
    pub fn settle(&mut self) -> Option<ElementId> {
        if !self.active {
            return None;
        }
        let target = match self.pending_initial.take()? {
            InitialFocus::Target(id) => Some(id),
            InitialFocus::FirstInput => {
                let set = self.set.borrow();
                set.first_data_entry().or_else(|| set.first())
            }
        }?;
        if self.host.focus(target) {
            Some(target)
        } else {
            tracing::debug!(?target, "initial focus target refused focus");
            None
        }
    }

    /// Route a tab press.
    pub fn handle_tab(&mut self, backward: bool) -> TabOutcome {
        if !self.active || !self.options.trap {
            return TabOutcome::PassThrough;
        }
        let (first, last, position) = {
            let set = self.set.borrow();
            let (Some(first), Some(last)) = (set.first(), set.last()) else {
                return TabOutcome::Blocked;
            };
            let position = self
                .host
                .active_element()
                .and_then(|id| set.position(id).map(|pos| (pos, set.len())));
            (first, last, position)
        };

        match position {
            None => {
                let target = if backward { last } else { first };
                self.host.focus(target);
                TabOutcome::Redirected(target)
            }
            Some((pos, len)) if !backward && pos + 1 == len => {
                self.host.focus(first);
                TabOutcome::Wrapped(first)
            }
            Some((0, _)) if backward => {
                self.host.focus(last);
                TabOutcome::Wrapped(last)
            }
            Some(_) => TabOutcome::PassThrough,
        }
    }

    /// Stop observing and restore the pre-activation focus.
    ///
    /// Returns the element focus was restored to.
    pub fn deactivate(&mut self) -> Option<ElementId> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.observer = None;
        self.pending_initial = None;
        tracing::debug!("focus trap deactivated");

        if !self.options.restore {
            return None;
        }
        let previous = self.previous.take()?;
        if self.host.is_attached(previous) && self.host.focus(previous) {
            Some(previous)
        } else {
            tracing::warn!(?previous, "focus restore target is gone");
            None
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn traps(&self) -> bool {
        self.options.trap
    }

    #[must_use]
    pub fn previous_focus(&self) -> Option<ElementId> {
        self.previous
    }

    #[must_use]
    pub fn focusable_set(&self) -> FocusableSet {
        self.set.borrow().clone()
    }

    #[must_use]
    pub fn region(&self) -> &FocusRegion {
        &self.region
    }

    /// Kind of the currently focused element, if it lives in the region.
    #[must_use]
    pub fn focused_kind(&self) -> Option<ElementKind> {
        self.host
            .active_element()
            .and_then(|id| self.region.kind_of(id))
    }
}

impl Drop for FocusTrap {
    fn drop(&mut self) {
        self.deactivate();
    }
}
