#![forbid(unsafe_code)]

//! PanelKit widgets.
//!
//! The [`modal`] module hosts multi-panel forms in overlay dialogs: it gates
//! content on async data, traps focus, guards close attempts and contains
//! render failures. Rendering is headless; hosts draw the returned view
//! descriptions.

pub mod modal;

pub use modal::{
    ModalConfig, ModalShell, ModalShellBuilder, ModalStack, ModalStrings, PanelName,
    ReadinessTracker, RenderFailureBoundary,
};
