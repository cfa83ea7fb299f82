pub mod config;
pub mod recognizer;

pub use config::ConfigStore;
pub use recognizer::{EventEmitter, RecognitionProvider, Recognizer};
