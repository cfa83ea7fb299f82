pub mod config_store;
pub mod scripted;
pub mod unsupported;

pub use config_store::TomlConfigStore;
pub use scripted::{Lifecycle, RecognizerCall, ScriptedProvider};
pub use unsupported::UnsupportedProvider;
