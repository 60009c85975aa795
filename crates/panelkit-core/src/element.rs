#![forbid(unsafe_code)]

//! Element model for focus management.
//!
//! A modal's interactive surface is described as an ordered list of
//! [`Element`]s in document order. Focus logic never touches host widgets
//! directly; it reads this description and asks a [`FocusHost`] to move focus.
//!
//! # Focusability
//!
//! An element is focusable when all of the following hold:
//!
//! - it is visible (not collapsed or hidden),
//! - it is not disabled and not inert,
//! - it is not a hidden-type input,
//! - its tab index, if any, is non-negative,
//! - it is natively focusable, or it carries an explicit tab index.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashSet;

/// Host-assigned identity of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What sort of control an element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementKind {
    TextInput,
    NumberInput,
    /// Single-line selection control.
    Select,
    /// Editable combo box / autocomplete.
    Combobox,
    /// Multi-line text field.
    TextArea,
    /// `type=hidden` style input; never focusable.
    HiddenInput,
    Checkbox,
    Radio,
    Button,
    Link,
    /// Any other element; focusable only with an explicit tab index.
    #[default]
    Generic,
}

impl ElementKind {
    /// Whether the element takes focus without an explicit tab index.
    #[must_use]
    pub const fn is_natively_focusable(self) -> bool {
        !matches!(self, Self::HiddenInput | Self::Generic)
    }

    /// Text, number, and selection inputs: the targets of auto-focus.
    #[must_use]
    pub const fn is_data_entry(self) -> bool {
        matches!(
            self,
            Self::TextInput | Self::NumberInput | Self::Select | Self::Combobox | Self::TextArea
        )
    }

    /// Controls that consume Enter themselves (newline, open list, activate).
    #[must_use]
    pub const fn consumes_enter(self) -> bool {
        matches!(
            self,
            Self::TextArea | Self::Select | Self::Combobox | Self::Button
        )
    }
}

/// Description of one element inside a modal region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub visible: bool,
    pub disabled: bool,
    /// Marked non-interactive (inert / aria-hidden subtree).
    pub inert: bool,
    pub tab_index: Option<i32>,
}

impl Element {
    /// A visible, enabled element.
    #[must_use]
    pub fn new(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            visible: true,
            disabled: false,
            inert: false,
            tab_index: None,
        }
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub fn inert(mut self) -> Self {
        self.inert = true;
        self
    }

    #[must_use]
    pub fn tab_index(mut self, index: i32) -> Self {
        self.tab_index = Some(index);
        self
    }

    /// Whether keyboard focus may land on this element.
    #[must_use]
    pub fn is_focusable(&self) -> bool {
        if !self.visible || self.disabled || self.inert {
            return false;
        }
        if self.kind == ElementKind::HiddenInput {
            return false;
        }
        match self.tab_index {
            Some(index) if index < 0 => false,
            Some(_) => true,
            None => self.kind.is_natively_focusable(),
        }
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// The host's focus system.
///
/// Methods take `&self`; implementations use interior mutability so a single
/// host can be shared by every open modal.
pub trait FocusHost {
    /// The element currently holding focus anywhere in the host, if any.
    fn active_element(&self) -> Option<ElementId>;

    /// Move focus to `id`. Returns `false` if the element is gone or refuses focus.
    fn focus(&self, id: ElementId) -> bool;

    /// Whether `id` is still present in the host.
    fn is_attached(&self, id: ElementId) -> bool;
}

#[derive(Debug, Default)]
struct RegistryInner {
    attached: AHashSet<ElementId>,
    active: Option<ElementId>,
}

/// In-memory [`FocusHost`] for hosts without a native focus system.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FocusRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl FocusRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element as present.
    pub fn attach(&self, id: impl Into<ElementId>) {
        self.inner.borrow_mut().attached.insert(id.into());
    }

    /// Register several elements at once.
    pub fn attach_all(&self, ids: impl IntoIterator<Item = ElementId>) {
        self.inner.borrow_mut().attached.extend(ids);
    }

    /// Remove an element. Focus held by it is dropped.
    pub fn detach(&self, id: impl Into<ElementId>) {
        let id = id.into();
        let mut inner = self.inner.borrow_mut();
        inner.attached.remove(&id);
        if inner.active == Some(id) {
            inner.active = None;
        }
    }

    /// Clear focus without moving it anywhere.
    pub fn blur(&self) {
        self.inner.borrow_mut().active = None;
    }
}

impl FocusHost for FocusRegistry {
    fn active_element(&self) -> Option<ElementId> {
        self.inner.borrow().active
    }

    fn focus(&self, id: ElementId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.attached.contains(&id) {
            return false;
        }
        inner.active = Some(id);
        true
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.inner.borrow().attached.contains(&id)
    }
}

impl<H: FocusHost + ?Sized> FocusHost for Rc<H> {
    fn active_element(&self) -> Option<ElementId> {
        (**self).active_element()
    }

    fn focus(&self, id: ElementId) -> bool {
        (**self).focus(id)
    }

    fn is_attached(&self, id: ElementId) -> bool {
        (**self).is_attached(id)
    }
}
