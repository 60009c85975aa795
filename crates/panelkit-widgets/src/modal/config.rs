#![forbid(unsafe_code)]

//! Plain-data modal configuration.
//!
//! Behavioral options (predicates, callbacks, reactive flags) are not data and
//! live on [`ModalShellBuilder`](super::ModalShellBuilder) instead.
//!
//! With the `policy-config` feature a config can be loaded from TOML or JSON.
//! Durations are written in milliseconds:
//!
//! ```toml
//! prevent_escape_close = true
//! close_animation_ms = 150
//! max_retries = 5
//! ```

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::strings::ModalStrings;

/// Modal behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModalConfig {
    /// Ignore the Escape key as a close trigger.
    pub prevent_escape_close: bool,
    /// Ignore backdrop clicks as a close trigger. Enabled by default.
    pub prevent_backdrop_close: bool,
    /// Prompt shown when closing with unsaved changes.
    pub unsaved_changes_message: String,
    pub trap_focus: bool,
    pub auto_focus_first_input: bool,
    pub restore_focus: bool,
    pub enable_animations: bool,
    /// Delay between the start of the exit animation and the close callback.
    #[cfg_attr(feature = "serde", serde(rename = "close_animation_ms", with = "millis"))]
    pub close_animation: Duration,
    /// Render failures tolerated before retry is withdrawn.
    pub max_retries: u32,
    /// Failure-free window after which the retry counter resets.
    #[cfg_attr(feature = "serde", serde(rename = "retry_cooldown_ms", with = "millis"))]
    pub retry_cooldown: Duration,
    /// Include technical detail in the render failure fallback.
    pub show_error_details: bool,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            prevent_escape_close: false,
            prevent_backdrop_close: true,
            unsaved_changes_message: ModalStrings::spanish().unsaved_confirm.into_owned(),
            trap_focus: true,
            auto_focus_first_input: false,
            restore_focus: true,
            enable_animations: true,
            close_animation: Self::DEFAULT_CLOSE_ANIMATION,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_cooldown: Self::DEFAULT_RETRY_COOLDOWN,
            show_error_details: cfg!(debug_assertions),
        }
    }
}

impl ModalConfig {
    pub const DEFAULT_CLOSE_ANIMATION: Duration = Duration::from_millis(250);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prevent_escape_close(mut self, prevent: bool) -> Self {
        self.prevent_escape_close = prevent;
        self
    }

    #[must_use]
    pub fn prevent_backdrop_close(mut self, prevent: bool) -> Self {
        self.prevent_backdrop_close = prevent;
        self
    }

    #[must_use]
    pub fn unsaved_changes_message(mut self, message: impl Into<String>) -> Self {
        self.unsaved_changes_message = message.into();
        self
    }

    #[must_use]
    pub fn trap_focus(mut self, trap: bool) -> Self {
        self.trap_focus = trap;
        self
    }

    #[must_use]
    pub fn auto_focus_first_input(mut self, auto: bool) -> Self {
        self.auto_focus_first_input = auto;
        self
    }

    #[must_use]
    pub fn restore_focus(mut self, restore: bool) -> Self {
        self.restore_focus = restore;
        self
    }

    #[must_use]
    pub fn enable_animations(mut self, enable: bool) -> Self {
        self.enable_animations = enable;
        self
    }

    #[must_use]
    pub fn close_animation(mut self, duration: Duration) -> Self {
        self.close_animation = duration;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn retry_cooldown(mut self, cooldown: Duration) -> Self {
        self.retry_cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn show_error_details(mut self, show: bool) -> Self {
        self.show_error_details = show;
        self
    }

    /// Delay before the close callback fires after an approved close.
    #[must_use]
    pub fn effective_close_delay(&self) -> Duration {
        if self.enable_animations {
            self.close_animation
        } else {
            Duration::ZERO
        }
    }

    /// Reject values the runtime cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid {
                field: "max_retries",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

#[cfg(feature = "policy-config")]
impl ModalConfig {
    /// Parse and validate a TOML policy document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON policy document. Missing keys take defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "serde")]
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Configuration loading or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "policy-config")]
            Self::Toml(err) => write!(f, "invalid TOML modal config: {err}"),
            #[cfg(feature = "policy-config")]
            Self::Json(err) => write!(f, "invalid JSON modal config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "policy-config")]
            Self::Toml(err) => Some(err),
            #[cfg(feature = "policy-config")]
            Self::Json(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ModalConfig::default();
        assert!(!config.prevent_escape_close);
        assert!(config.prevent_backdrop_close);
        assert!(config.trap_focus);
        assert!(!config.auto_focus_first_input);
        assert!(config.restore_focus);
        assert!(config.enable_animations);
        assert_eq!(config.close_animation, Duration::from_millis(250));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_cooldown, Duration::from_secs(30));
        assert_eq!(config.show_error_details, cfg!(debug_assertions));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let config = ModalConfig::new()
            .prevent_escape_close(true)
            .prevent_backdrop_close(false)
            .unsaved_changes_message("discard?")
            .max_retries(5);
        assert!(config.prevent_escape_close);
        assert!(!config.prevent_backdrop_close);
        assert_eq!(config.unsaved_changes_message, "discard?");
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn close_delay_follows_animation_flag() {
        let config = ModalConfig::new().close_animation(Duration::from_millis(400));
        assert_eq!(config.effective_close_delay(), Duration::from_millis(400));
        assert_eq!(
            config.enable_animations(false).effective_close_delay(),
            Duration::ZERO
        );
    }

    #[test]
    fn zero_retries_rejected() {
        let err = ModalConfig::new().max_retries(0).validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid `max_retries`: must be at least 1");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_json_uses_millis() {
        let config = ModalConfig::new().close_animation(Duration::from_millis(120));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["close_animation_ms"], 120);
        assert_eq!(json["retry_cooldown_ms"], 30_000);
        let back: ModalConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_partial_document_keeps_defaults() {
        let config = ModalConfig::from_toml_str(
            "prevent_escape_close = true\nclose_animation_ms = 150\nmax_retries = 5\n",
        )
        .unwrap();
        assert!(config.prevent_escape_close);
        assert!(config.prevent_backdrop_close);
        assert_eq!(config.close_animation, Duration::from_millis(150));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_cooldown, Duration::from_secs(30));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_errors_surface() {
        assert!(matches!(
            ModalConfig::from_toml_str("max_retries = \"three\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            ModalConfig::from_toml_str("max_retries = 0"),
            Err(ConfigError::Invalid { field: "max_retries", .. })
        ));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_document() {
        let config = ModalConfig::from_json_str(r#"{"trap_focus": false}"#).unwrap();
        assert!(!config.trap_focus);
        assert!(matches!(
            ModalConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }
}
