#![forbid(unsafe_code)]

//! Input events delivered to modal components.
//!
//! Hosts translate their native keyboard and pointer input into these types.
//! Pointer input is pre-resolved against the last rendered layout: a
//! [`ClickEvent`] already carries the [`HitRegion`] the click landed in, so
//! components never perform geometry themselves.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT = 0b0000_0010;
        const CTRL = 0b0000_0100;
        const SUPER = 0b0000_1000;
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    /// Shift+Tab as reported by hosts that fold the modifier into the code.
    BackTab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    F(u8),
}

/// Press / repeat / release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A single keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }

    /// Whether this is a backward tab (`BackTab`, or `Tab` with Shift held).
    #[must_use]
    pub fn is_back_tab(&self) -> bool {
        match self.code {
            KeyCode::BackTab => true,
            KeyCode::Tab => self.modifiers.contains(Modifiers::SHIFT),
            _ => false,
        }
    }

    /// Whether this is any kind of tab press.
    #[must_use]
    pub fn is_tab(&self) -> bool {
        matches!(self.code, KeyCode::Tab | KeyCode::BackTab)
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// Mouse button that produced a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Region tag resolved by the host's hit testing.
///
/// Component crates reserve `Custom` values for their own regions (the modal
/// module uses them for backdrop and content).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitRegion {
    /// Nothing registered at the click position.
    #[default]
    None,
    Custom(u16),
}

/// A pointer click, already resolved to the innermost region it hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickEvent {
    pub button: MouseButton,
    pub region: HitRegion,
}

impl ClickEvent {
    /// A left click on `region`.
    #[must_use]
    pub const fn left(region: HitRegion) -> Self {
        Self {
            button: MouseButton::Left,
            region,
        }
    }
}

/// Input delivered to a mounted modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Key(KeyEvent),
    Click(ClickEvent),
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Self::Key(key)
    }
}

impl From<ClickEvent> for Event {
    fn from(click: ClickEvent) -> Self {
        Self::Click(click)
    }
}
