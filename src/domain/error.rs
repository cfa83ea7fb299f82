use thiserror::Error;

/// Domain-level errors for Plume.
///
/// These never cross the session controller's public boundary: recognizer
/// failures are turned into a raw code and classified into an
/// [`ErrorRecord`](crate::domain::ErrorRecord) instead.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    /// The recognition capability rejected a call. `code` is the raw failure
    /// code as reported by the host (e.g. "not-allowed", "InvalidStateError").
    #[error("Recognizer failed: {code}")]
    Recognizer { code: String },

    #[error("Speech recognition is not supported on this host")]
    Unsupported,
}

impl DomainError {
    /// Raw failure code used for classification.
    pub fn raw_code(&self) -> &str {
        match self {
            DomainError::Recognizer { code } => code,
            DomainError::Unsupported => "service-not-allowed",
            DomainError::Config(_) => "config",
            DomainError::Serialization(_) => "serialization",
            DomainError::Io(_) => "io",
        }
    }

    pub fn recognizer(code: impl Into<String>) -> Self {
        DomainError::Recognizer { code: code.into() }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizer_raw_code() {
        let err = DomainError::recognizer("not-allowed");
        assert_eq!(err.raw_code(), "not-allowed");
        assert_eq!(err.to_string(), "Recognizer failed: not-allowed");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DomainError = io.into();
        assert!(matches!(err, DomainError::Io(_)));
        assert_eq!(err.raw_code(), "io");
    }
}
