use crate::domain::{DomainError, SessionConfig};
use crate::ports::{RecognitionProvider, Recognizer};

/// Provider for hosts without a speech recognition engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProvider;

impl RecognitionProvider for UnsupportedProvider {
    fn is_supported(&self) -> bool {
        false
    }

    fn create(&self, _config: &SessionConfig) -> Result<Box<dyn Recognizer>, DomainError> {
        Err(DomainError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider() {
        let provider = UnsupportedProvider;
        assert!(!provider.is_supported());
        assert!(matches!(
            provider.create(&SessionConfig::default()),
            Err(DomainError::Unsupported)
        ));
    }
}
