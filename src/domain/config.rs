use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

/// Per-controller recognizer settings. Fixed for the lifetime of a
/// session controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keep listening across pauses instead of ending after one utterance.
    pub continuous: bool,
    /// Deliver interim (revisable) results.
    pub interim_results: bool,
    /// BCP-47 language tag, e.g. "en-US", "fr-FR".
    pub language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: "en-US".to_string(),
        }
    }
}

impl SessionConfig {
    /// Check that the language tag looks like a BCP-47 tag: ASCII
    /// alphanumeric subtags of 1 to 8 characters separated by '-'.
    pub fn validate(&self) -> Result<(), DomainError> {
        let valid = !self.language.is_empty()
            && self.language.split('-').all(|subtag| {
                (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
            });

        if valid {
            Ok(())
        } else {
            Err(DomainError::Config(format!(
                "Invalid language tag: {:?}",
                self.language
            )))
        }
    }
}

/// Session timer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between `start()` and the actual recognizer start. Repeated
    /// triggers inside this window collapse into one start.
    pub start_debounce_ms: u64,
    /// How long a recoverable error stays visible before the session
    /// returns to Idle on its own.
    pub error_clear_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_debounce_ms: 100,
            error_clear_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn start_debounce(&self) -> Duration {
        Duration::from_millis(self.start_debounce_ms)
    }

    pub fn error_clear(&self) -> Duration {
        Duration::from_millis(self.error_clear_ms)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub timing: TimingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.session.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert!(config.session.continuous);
        assert!(config.session.interim_results);
        assert_eq!(config.session.language, "en-US");
        assert_eq!(config.timing.start_debounce(), Duration::from_millis(100));
        assert_eq!(config.timing.error_clear(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_language_validation() {
        let mut session = SessionConfig::default();
        for tag in ["fr", "fr-FR", "zh-Hant-TW", "es-419"] {
            session.language = tag.to_string();
            assert!(session.validate().is_ok(), "{tag}");
        }
        for tag in ["", "fr_FR", "fr--FR", "-fr", "toolongsubtag"] {
            session.language = tag.to_string();
            assert!(session.validate().is_err(), "{tag}");
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [session]
            language = "fr-FR"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.language, "fr-FR");
        assert!(config.session.continuous);
        assert_eq!(config.timing, TimingConfig::default());
    }
}
