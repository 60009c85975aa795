#![forbid(unsafe_code)]

//! User-facing text rendered by the modal shell and its failure fallback.

use std::borrow::Cow;

/// Text shown by the shell, the gating view and the render fallback.
///
/// Spanish is the default locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalStrings {
    pub loading: Cow<'static, str>,
    pub retry: Cow<'static, str>,
    pub close: Cow<'static, str>,
    pub force_close: Cow<'static, str>,
    pub submit: Cow<'static, str>,
    pub dependency_error_title: Cow<'static, str>,
    pub render_error_title: Cow<'static, str>,
    pub render_error_description: Cow<'static, str>,
    pub retries_exhausted: Cow<'static, str>,
    pub unsaved_banner: Cow<'static, str>,
    pub unsaved_confirm: Cow<'static, str>,
}

impl Default for ModalStrings {
    fn default() -> Self {
        Self::spanish()
    }
}

impl ModalStrings {
    #[must_use]
    pub fn spanish() -> Self {
        Self {
            loading: Cow::Borrowed("Cargando..."),
            retry: Cow::Borrowed("Reintentar"),
            close: Cow::Borrowed("Cerrar"),
            force_close: Cow::Borrowed("Forzar cierre"),
            submit: Cow::Borrowed("Guardar"),
            dependency_error_title: Cow::Borrowed("No se pudieron cargar los datos"),
            render_error_title: Cow::Borrowed("Algo salió mal"),
            render_error_description: Cow::Borrowed(
                "No se pudo mostrar el contenido de esta ventana.",
            ),
            retries_exhausted: Cow::Borrowed(
                "Se agotaron los reintentos. Cierre la ventana e inténtelo más tarde.",
            ),
            unsaved_banner: Cow::Borrowed("Tienes cambios sin guardar"),
            unsaved_confirm: Cow::Borrowed(
                "Tienes cambios sin guardar. ¿Seguro que quieres cerrar?",
            ),
        }
    }

    #[must_use]
    pub fn english() -> Self {
        Self {
            loading: Cow::Borrowed("Loading..."),
            retry: Cow::Borrowed("Retry"),
            close: Cow::Borrowed("Close"),
            force_close: Cow::Borrowed("Force close"),
            submit: Cow::Borrowed("Save"),
            dependency_error_title: Cow::Borrowed("Could not load data"),
            render_error_title: Cow::Borrowed("Something went wrong"),
            render_error_description: Cow::Borrowed("This dialog's content could not be displayed."),
            retries_exhausted: Cow::Borrowed(
                "Retries exhausted. Close the dialog and try again later.",
            ),
            unsaved_banner: Cow::Borrowed("You have unsaved changes"),
            unsaved_confirm: Cow::Borrowed(
                "You have unsaved changes. Are you sure you want to close?",
            ),
        }
    }
}
