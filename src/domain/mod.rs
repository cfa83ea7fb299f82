pub mod classifier;
pub mod config;
pub mod error;
pub mod recognition;
pub mod session;
pub mod transcript;

pub use classifier::{classify, classify_with, Classification, ErrorCategory, ErrorClass, MessageCatalog};
pub use config::{AppConfig, LoggingConfig, SessionConfig, TimingConfig};
pub use error::DomainError;
pub use recognition::{Generation, RecognitionEvent, RecognitionSegment, TaggedEvent};
pub use session::{ErrorRecord, ErrorSeverity, SessionSnapshot, SessionState};
pub use transcript::{merge_final, replace_interim, TranscriptBuffer};
