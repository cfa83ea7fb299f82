use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::TomlConfigStore;
use crate::app::SessionController;
use crate::domain::{AppConfig, DomainError};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, RecognitionProvider};

/// Application controller: loads configuration, sets up logging and owns the
/// transcription session.
pub struct AppController {
    config: RwLock<AppConfig>,
    config_store: Arc<dyn ConfigStore>,
    session: SessionController,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize with the default on-disk configuration store.
    /// Must be called from within a Tokio runtime.
    pub fn new(provider: Arc<dyn RecognitionProvider>) -> Result<Self, DomainError> {
        let config_store = Arc::new(TomlConfigStore::new()?);
        Self::with_store(config_store, provider)
    }

    pub fn with_store(
        config_store: Arc<dyn ConfigStore>,
        provider: Arc<dyn RecognitionProvider>,
    ) -> Result<Self, DomainError> {
        let config = config_store.load()?;

        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
        )?;

        info!("Plume starting up");

        let session =
            SessionController::spawn(provider, config.session.clone(), config.timing.clone());

        info!(
            language = %config.session.language,
            supported = session.is_supported(),
            "AppController initialized"
        );

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            session,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Persist a new configuration. Session settings are fixed per session
    /// controller and take effect the next time one is created.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        self.config_store.save(&config)?;
        *self.config.write() = config;

        info!("Configuration updated");
        Ok(())
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ScriptedProvider, UnsupportedProvider};
    use crate::domain::SessionState;
    use std::{env, fs};

    fn store(name: &str) -> Arc<TomlConfigStore> {
        let dir = env::temp_dir().join(format!("plume_app_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let store = TomlConfigStore::at(&dir).unwrap();

        let mut config = AppConfig::new();
        config.logging.file_logging = false;
        config.session.language = "fr-FR".to_string();
        store.save(&config).unwrap();
        Arc::new(store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_app_controller_spawns_session_from_config() {
        let provider = ScriptedProvider::echoing();
        let app = AppController::with_store(store("session"), Arc::new(provider.clone())).unwrap();

        assert_eq!(app.config().session.language, "fr-FR");
        assert!(app.config_path().ends_with("config.toml"));

        app.session().start();
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        app.session().flush().await;

        assert_eq!(app.session().snapshot().state, SessionState::Listening);
        assert_eq!(provider.last_config().unwrap().language, "fr-FR");
    }

    #[tokio::test]
    async fn test_update_config_persists() {
        let store = store("update");
        let app = AppController::with_store(store.clone(), Arc::new(UnsupportedProvider)).unwrap();
        assert!(!app.session().is_supported());

        let mut config = app.config();
        config.timing.start_debounce_ms = 250;
        app.update_config(config.clone()).unwrap();

        assert_eq!(app.config(), config);
        assert_eq!(store.load().unwrap(), config);

        let _ = fs::remove_dir_all(store.data_dir());
    }

    #[tokio::test]
    async fn test_update_config_rejects_invalid() {
        let app = AppController::with_store(store("invalid"), Arc::new(UnsupportedProvider)).unwrap();

        let mut config = app.config();
        config.session.language = String::new();
        assert!(app.update_config(config).is_err());
        assert_eq!(app.config().session.language, "fr-FR");
    }
}
