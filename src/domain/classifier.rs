use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Category of a recognition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    NoSpeech,
    AudioCapture,
    PermissionDenied,
    Network,
    LanguageUnsupported,
    ServiceUnavailable,
    Aborted,
    Unknown,
}

/// How a failure is expected to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    /// Self-clears after a short delay, no caller action needed.
    Transient,
    /// Persists until the user fixes something and retries `start()`.
    UserActionRequired,
    /// Persists; the environment is at fault and retrying is up to the caller.
    Environmental,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 8] = [
        ErrorCategory::NoSpeech,
        ErrorCategory::AudioCapture,
        ErrorCategory::PermissionDenied,
        ErrorCategory::Network,
        ErrorCategory::LanguageUnsupported,
        ErrorCategory::ServiceUnavailable,
        ErrorCategory::Aborted,
        ErrorCategory::Unknown,
    ];

    /// Map a raw host failure code to its category.
    pub fn from_code(raw_code: &str) -> Self {
        match raw_code {
            "no-speech" => ErrorCategory::NoSpeech,
            "audio-capture" => ErrorCategory::AudioCapture,
            "not-allowed" => ErrorCategory::PermissionDenied,
            "network" => ErrorCategory::Network,
            "language-not-supported" => ErrorCategory::LanguageUnsupported,
            "service-not-allowed" => ErrorCategory::ServiceUnavailable,
            "aborted" => ErrorCategory::Aborted,
            _ => ErrorCategory::Unknown,
        }
    }

    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorCategory::NoSpeech | ErrorCategory::Aborted)
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorCategory::NoSpeech | ErrorCategory::Aborted => ErrorClass::Transient,
            ErrorCategory::PermissionDenied | ErrorCategory::AudioCapture => {
                ErrorClass::UserActionRequired
            }
            ErrorCategory::Network
            | ErrorCategory::ServiceUnavailable
            | ErrorCategory::LanguageUnsupported => ErrorClass::Environmental,
            ErrorCategory::Unknown => ErrorClass::Unknown,
        }
    }
}

/// Result of classifying a raw failure code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub class: ErrorClass,
    pub recoverable: bool,
    pub message: String,
}

/// Human-readable message templates keyed by category.
///
/// Templates may contain a `{code}` placeholder which is replaced with the
/// raw failure code.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    templates: HashMap<ErrorCategory, String>,
}

static ENGLISH: Lazy<MessageCatalog> = Lazy::new(|| {
    MessageCatalog::from_pairs(&[
        (ErrorCategory::NoSpeech, "No speech was detected. Try speaking again."),
        (ErrorCategory::AudioCapture, "No microphone was found. Check that one is connected."),
        (ErrorCategory::PermissionDenied, "Microphone access was denied. Allow access and try again."),
        (ErrorCategory::Network, "A network error interrupted speech recognition."),
        (ErrorCategory::LanguageUnsupported, "The selected language is not supported for dictation."),
        (ErrorCategory::ServiceUnavailable, "The speech recognition service is not available."),
        (ErrorCategory::Aborted, "Speech recognition was interrupted."),
        (ErrorCategory::Unknown, "Speech recognition failed: {code}"),
    ])
});

static FRENCH: Lazy<MessageCatalog> = Lazy::new(|| {
    MessageCatalog::from_pairs(&[
        (ErrorCategory::NoSpeech, "Aucune parole détectée. Essayez de parler à nouveau."),
        (ErrorCategory::AudioCapture, "Aucun microphone trouvé. Vérifiez qu'il est bien branché."),
        (ErrorCategory::PermissionDenied, "L'accès au microphone a été refusé. Autorisez-le puis réessayez."),
        (ErrorCategory::Network, "Une erreur réseau a interrompu la reconnaissance vocale."),
        (ErrorCategory::LanguageUnsupported, "La langue choisie n'est pas prise en charge pour la dictée."),
        (ErrorCategory::ServiceUnavailable, "Le service de reconnaissance vocale n'est pas disponible."),
        (ErrorCategory::Aborted, "La reconnaissance vocale a été interrompue."),
        (ErrorCategory::Unknown, "La reconnaissance vocale a échoué : {code}"),
    ])
});

impl MessageCatalog {
    fn from_pairs(pairs: &[(ErrorCategory, &str)]) -> Self {
        Self {
            templates: pairs
                .iter()
                .map(|(category, template)| (*category, template.to_string()))
                .collect(),
        }
    }

    pub fn english() -> &'static MessageCatalog {
        &ENGLISH
    }

    pub fn french() -> &'static MessageCatalog {
        &FRENCH
    }

    /// Pick a built-in catalog from a BCP-47 language tag.
    /// Falls back to English for languages without a catalog.
    pub fn for_language(language: &str) -> &'static MessageCatalog {
        let primary = language.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("fr") {
            Self::french()
        } else {
            Self::english()
        }
    }

    /// Replace the template for one category.
    pub fn with_template(mut self, category: ErrorCategory, template: impl Into<String>) -> Self {
        self.templates.insert(category, template.into());
        self
    }

    /// Render the message for `category`, substituting `raw_code`.
    pub fn render(&self, category: ErrorCategory, raw_code: &str) -> String {
        match self.templates.get(&category) {
            Some(template) => template.replace("{code}", raw_code),
            None => ENGLISH.render(category, raw_code),
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        ENGLISH.clone()
    }
}

/// Classify a raw failure code using the English catalog.
pub fn classify(raw_code: &str) -> Classification {
    classify_with(raw_code, MessageCatalog::english())
}

/// Classify a raw failure code, rendering the message from `catalog`.
pub fn classify_with(raw_code: &str, catalog: &MessageCatalog) -> Classification {
    let category = ErrorCategory::from_code(raw_code);
    Classification {
        category,
        class: category.class(),
        recoverable: category.is_recoverable(),
        message: catalog.render(category, raw_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        let cases = [
            ("no-speech", ErrorCategory::NoSpeech, true),
            ("audio-capture", ErrorCategory::AudioCapture, false),
            ("not-allowed", ErrorCategory::PermissionDenied, false),
            ("network", ErrorCategory::Network, false),
            ("language-not-supported", ErrorCategory::LanguageUnsupported, false),
            ("service-not-allowed", ErrorCategory::ServiceUnavailable, false),
            ("aborted", ErrorCategory::Aborted, true),
            ("bad-grammar", ErrorCategory::Unknown, false),
        ];

        for (code, category, recoverable) in cases {
            let result = classify(code);
            assert_eq!(result.category, category, "code {code}");
            assert_eq!(result.class, category.class(), "code {code}");
            assert_eq!(result.recoverable, recoverable, "code {code}");
        }
    }

    #[test]
    fn test_unknown_message_includes_raw_code() {
        let result = classify("InvalidStateError");
        assert_eq!(result.category, ErrorCategory::Unknown);
        assert!(result.message.contains("InvalidStateError"));
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        assert_eq!(classify("Aborted").category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_every_category_has_message_in_builtin_catalogs() {
        for category in ErrorCategory::ALL {
            assert!(!MessageCatalog::english().render(category, "x").is_empty());
            assert!(!MessageCatalog::french().render(category, "x").is_empty());
        }
    }

    #[test]
    fn test_catalog_for_language() {
        let fr = classify_with("no-speech", MessageCatalog::for_language("fr-CA"));
        assert!(fr.message.starts_with("Aucune parole"));

        let en = classify_with("no-speech", MessageCatalog::for_language("de-DE"));
        assert!(en.message.starts_with("No speech"));
    }

    #[test]
    fn test_custom_template() {
        let catalog = MessageCatalog::default()
            .with_template(ErrorCategory::Network, "offline ({code})");
        assert_eq!(classify_with("network", &catalog).message, "offline (network)");
    }

    #[test]
    fn test_error_class() {
        assert_eq!(ErrorCategory::NoSpeech.class(), ErrorClass::Transient);
        assert_eq!(ErrorCategory::Aborted.class(), ErrorClass::Transient);
        assert_eq!(ErrorCategory::PermissionDenied.class(), ErrorClass::UserActionRequired);
        assert_eq!(ErrorCategory::AudioCapture.class(), ErrorClass::UserActionRequired);
        assert_eq!(ErrorCategory::Network.class(), ErrorClass::Environmental);
        assert_eq!(ErrorCategory::Unknown.class(), ErrorClass::Unknown);
    }
}
