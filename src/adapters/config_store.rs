use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::domain::{AppConfig, DomainError};
use crate::ports::ConfigStore;

const APP_DIR: &str = "Plume";
const CONFIG_FILE: &str = "config.toml";

/// TOML-based configuration store.
pub struct TomlConfigStore {
    data_dir: PathBuf,
}

impl TomlConfigStore {
    /// Create a store in the OS-specific application data directory.
    pub fn new() -> Result<Self, DomainError> {
        Self::at(Self::default_data_dir()?)
    }

    /// Create a store rooted at `data_dir`, creating the directory if needed.
    pub fn at(data_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        info!(data_dir = ?data_dir, "ConfigStore initialized");

        Ok(Self { data_dir })
    }

    /// - macOS: ~/Library/Application Support/Plume/
    /// - Windows: %APPDATA%\Plume\
    /// - Linux: ~/.config/Plume/
    fn default_data_dir() -> Result<PathBuf, DomainError> {
        #[cfg(target_os = "macos")]
        let base = dirs::data_dir();

        #[cfg(not(target_os = "macos"))]
        let base = dirs::config_dir();

        base.map(|p| p.join(APP_DIR))
            .ok_or_else(|| DomainError::Config("Could not find application data directory".to_string()))
    }

    /// - macOS: <data dir>/logs/
    /// - Windows: %LOCALAPPDATA%\Plume\logs\
    /// - Linux: ~/.local/share/Plume/logs/
    fn resolve_logs_dir(&self) -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            self.data_dir.join("logs")
        }

        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .map(|p| p.join(APP_DIR).join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs::data_dir()
                .map(|p| p.join(APP_DIR).join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            return Ok(config);
        }

        debug!(path = ?config_path, "Loading configuration");
        let content = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&content)?;
        if let Err(e) = config.validate() {
            warn!(path = ?config_path, error = %e, "Rejected stored configuration");
            return Err(e);
        }

        info!(path = ?config_path, language = %config.session.language, "Configuration loaded");
        Ok(config)
    }

    fn save(&self, config: &AppConfig) -> Result<(), DomainError> {
        config.validate()?;

        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&config_path, content)?;

        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        self.resolve_logs_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_store(name: &str) -> (TomlConfigStore, PathBuf) {
        let dir = env::temp_dir().join(format!("plume_config_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        (TomlConfigStore::at(&dir).unwrap(), dir)
    }

    #[test]
    fn test_config_store_paths() {
        let (store, dir) = temp_store("paths");
        assert!(store.config_path().ends_with("config.toml"));
        assert!(store.logs_dir().to_string_lossy().contains("logs"));
        assert_eq!(store.data_dir(), dir);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_creates_default() {
        let (store, dir) = temp_store("default");
        let config = store.load().unwrap();
        assert_eq!(config, AppConfig::new());
        assert!(store.config_path().exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_config_roundtrip() {
        let (store, dir) = temp_store("roundtrip");

        let mut config = AppConfig::new();
        config.session.language = "fr-FR".to_string();
        config.session.interim_results = false;
        config.timing.error_clear_ms = 1_500;
        config.logging.level = "debug".to_string();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_language_rejected() {
        let (store, dir) = temp_store("invalid");

        let mut config = AppConfig::new();
        config.session.language = "not a tag".to_string();
        assert!(matches!(store.save(&config), Err(DomainError::Config(_))));

        fs::write(store.config_path(), "[session]\nlanguage = \"\"\n").unwrap();
        assert!(matches!(store.load(), Err(DomainError::Config(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let (store, dir) = temp_store("malformed");
        fs::write(store.config_path(), "session = [").unwrap();
        assert!(matches!(store.load(), Err(DomainError::Config(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
