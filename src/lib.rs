//! Race-free streaming transcription sessions.
//!
//! [`SessionController`] wraps a host speech recognition capability
//! ([`RecognitionProvider`]) behind a small command surface (`start`, `stop`,
//! `abort`, `reset`) and publishes [`SessionSnapshot`]s to any number of
//! listeners. Start attempts are debounced and tagged with a [`Generation`]
//! so events from superseded attempts never touch the transcript.
#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use adapters::{ScriptedProvider, TomlConfigStore, UnsupportedProvider};
pub use app::{AppController, SessionController, Subscription};
pub use domain::{
    classify, merge_final, replace_interim, AppConfig, Classification, DomainError, ErrorCategory,
    ErrorClass, ErrorRecord, ErrorSeverity, Generation, RecognitionEvent, RecognitionSegment,
    SessionConfig, SessionSnapshot, SessionState, TimingConfig,
};
pub use ports::{EventEmitter, RecognitionProvider, Recognizer};
