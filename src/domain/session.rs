use serde::{Deserialize, Serialize};

use crate::domain::classifier::{Classification, ErrorCategory, ErrorClass};
use crate::domain::recognition::Generation;
use crate::domain::DomainError;

/// Whether a session error clears itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorSeverity {
    Recoverable,
    Fatal,
}

/// Transcription session state machine.
///
/// State transitions:
/// - Idle / Error -> Starting (start)
/// - Starting -> Listening (recognizer started)
/// - Starting / Listening -> Error (recognizer error, or a failed start call)
/// - any -> Idle (recognizer ended, abort)
/// - Error(Recoverable) -> Idle (error-clear timer)
///
/// `stop` does not change the state; the session stays Listening until the
/// recognizer reports that it has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Listening,
    Error(ErrorSeverity),
}

impl SessionState {
    /// A recognizer instance is active (or about to be).
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Listening)
    }

    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Error(_))
    }

    #[must_use]
    pub fn can_stop(&self) -> bool {
        matches!(self, SessionState::Listening)
    }
}

/// A classified failure attached to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub category: ErrorCategory,
    pub class: ErrorClass,
    pub recoverable: bool,
    pub message: String,
    pub generation: Generation,
}

impl ErrorRecord {
    pub fn new(classification: Classification, generation: Generation) -> Self {
        Self {
            category: classification.category,
            class: classification.class,
            recoverable: classification.recoverable,
            message: classification.message,
            generation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        if self.recoverable {
            ErrorSeverity::Recoverable
        } else {
            ErrorSeverity::Fatal
        }
    }
}

/// Consistent view of a session, delivered to every listener on change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub is_listening: bool,
    pub transcript: String,
    pub interim_transcript: String,
    pub error: Option<ErrorRecord>,
    pub is_supported: bool,
}

impl SessionSnapshot {
    pub fn initial(is_supported: bool) -> Self {
        Self {
            state: SessionState::Idle,
            is_listening: false,
            transcript: String::new(),
            interim_transcript: String::new(),
            error: None,
            is_supported,
        }
    }

    /// JSON form for a presentation layer.
    pub fn to_json(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classifier::classify;

    #[test]
    fn test_session_state_can_start() {
        assert!(SessionState::Idle.can_start());
        assert!(!SessionState::Starting.can_start());
        assert!(!SessionState::Listening.can_start());
        assert!(SessionState::Error(ErrorSeverity::Recoverable).can_start());
        assert!(SessionState::Error(ErrorSeverity::Fatal).can_start());
    }

    #[test]
    fn test_session_state_can_stop() {
        assert!(!SessionState::Idle.can_stop());
        assert!(!SessionState::Starting.can_stop());
        assert!(SessionState::Listening.can_stop());
        assert!(!SessionState::Error(ErrorSeverity::Fatal).can_stop());
    }

    #[test]
    fn test_error_record_severity() {
        let record = ErrorRecord::new(classify("no-speech"), Generation::from(3));
        assert_eq!(record.severity(), ErrorSeverity::Recoverable);
        assert_eq!(record.generation, Generation::from(3));

        let record = ErrorRecord::new(classify("network"), Generation::from(3));
        assert_eq!(record.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_error_record_json_carries_class() {
        let mut snapshot = SessionSnapshot::initial(true);
        snapshot.state = SessionState::Error(ErrorSeverity::Fatal);
        snapshot.error = Some(ErrorRecord::new(classify("not-allowed"), Generation::from(2)));

        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["error"]["category"], "permissionDenied");
        assert_eq!(value["error"]["class"], "userActionRequired");
        assert_eq!(value["error"]["recoverable"], false);
        assert_eq!(value["error"]["generation"], 2);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = SessionSnapshot::initial(true);
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["state"], "idle");
        assert_eq!(value["isListening"], false);
        assert_eq!(value["interimTranscript"], "");
        assert_eq!(value["isSupported"], true);
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_error_state_json() {
        let json = serde_json::to_string(&SessionState::Error(ErrorSeverity::Fatal)).unwrap();
        assert_eq!(json, r#"{"error":"fatal"}"#);
    }
}
