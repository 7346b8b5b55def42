//! Configuration file management
//!
//! Settings live in a TOML file at `$GCS_CONFIG_DIR/config.toml`, falling
//! back to `<platform config dir>/gcs/config.toml`. A missing file reads as
//! the default configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryConfig;

/// Overrides the directory holding `config.toml`.
pub const CONFIG_DIR_VAR: &str = "GCS_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,

    /// Project used by bucket listing, bucket creation and service account
    /// lookups when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Alternative API endpoint, e.g. a local emulator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            project: None,
            endpoint: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Loads and saves [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default configuration location.
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("gcs"),
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE_NAME)))
    }

    /// Manager for an explicit file, mainly for tests.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Unsupported config schema version {} in {}",
                config.schema_version,
                self.config_path.display()
            )));
        }
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, contents)?;
        tracing::debug!(path = %self.config_path.display(), "Saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn manager() -> (TempDir, ConfigManager) {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("gcs").join("config.toml"));
        (dir, manager)
    }

    #[test]
    fn test_missing_file_is_default() {
        let (_dir, manager) = manager();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retry.maximum_duration_secs, 300);
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, manager) = manager();
        let mut config = Config {
            project: Some("my-project".into()),
            endpoint: Some("http://localhost:9000".into()),
            ..Default::default()
        };
        config.retry.maximum_failures = Some(3);

        manager.save(&config).unwrap();
        assert!(manager.config_path().exists());
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let (dir, manager) = manager();
        std::fs::create_dir_all(dir.path().join("gcs")).unwrap();
        std::fs::write(
            manager.config_path(),
            "project = \"p\"\n\n[retry]\ninitial_backoff_ms = 250\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.project.as_deref(), Some("p"));
        assert_eq!(config.retry.initial_backoff_ms, 250);
        assert_eq!(config.retry.max_backoff_ms, 300_000);
    }

    #[test]
    fn test_invalid_toml() {
        let (dir, manager) = manager();
        std::fs::create_dir_all(dir.path().join("gcs")).unwrap();
        std::fs::write(manager.config_path(), "project = ").unwrap();
        assert!(matches!(manager.load(), Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let (dir, manager) = manager();
        std::fs::create_dir_all(dir.path().join("gcs")).unwrap();
        std::fs::write(manager.config_path(), "schema_version = 99\n").unwrap();
        assert!(matches!(manager.load(), Err(Error::Config(_))));
    }
}
