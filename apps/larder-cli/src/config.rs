//! # CLI Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`LARDER_*`, e.g. `LARDER_PLAN=pro`)
//! 3. Config file (`larder.toml` in the working directory, or `--config`)
//! 4. Defaults (this file)
//!
//! ```toml
//! # larder.toml
//! plan = "basic"
//! currency_symbol = "R$"
//! database_path = "./data/larder.db"
//! ```

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use larder_core::{Plan, DEFAULT_TENANT_ID};

/// Application configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Tenant whose records every command reads and writes.
    pub tenant_id: String,

    /// Subscription plan; gates commands and the sheet quota.
    pub plan: Plan,

    /// Prefix for money in text output.
    pub currency_symbol: String,
}

impl AppConfig {
    /// Loads defaults, then the config file, then `LARDER_*` variables.
    ///
    /// An explicit `config_file` must exist; the implicit `larder.toml` is
    /// optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("larder").required(false),
        };

        Self::from_sources(file, Environment::with_prefix("LARDER"))
    }

    fn from_sources<F, E>(file: F, env: E) -> Result<Self, ConfigError>
    where
        F: ::config::Source + Send + Sync + 'static,
        E: ::config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .set_default("tenant_id", DEFAULT_TENANT_ID)?
            .set_default("plan", Plan::Free.as_str())?
            .set_default("currency_symbol", "R$")?
            .add_source(file)
            .add_source(env)
            .build()?;

        let config: AppConfig = config.try_deserialize()?;

        if config.tenant_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("tenant_id".to_string()));
        }

        Ok(config)
    }

    /// Resolves the database file.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/app.larder.larder/larder.db`
    /// - **Windows**: `%APPDATA%\larder\larder\data\larder.db`
    /// - **Linux**: `~/.local/share/larder/larder.db`
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let proj_dirs =
            ProjectDirs::from("app", "larder", "larder").ok_or(ConfigError::NoDataDir)?;
        let data_dir = proj_dirs.data_dir();

        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("larder.db"))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    /// Environment source that never reads the real process environment.
    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("LARDER").source(Some(source))
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let missing = File::with_name("/nonexistent/larder").required(false);
        let config = AppConfig::from_sources(missing, env(&[])).unwrap();

        assert_eq!(config.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(config.plan, Plan::Free);
        assert_eq!(config.currency_symbol, "R$");
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_file_then_env() {
        let file = toml_file(
            r#"
            plan = "basic"
            currency_symbol = "€"
            database_path = "/tmp/larder-test.db"
            "#,
        );

        let config =
            AppConfig::from_sources(File::from(file.path()), env(&[("LARDER_PLAN", "pro")]))
                .unwrap();

        assert_eq!(config.plan, Plan::Pro);
        assert_eq!(config.currency_symbol, "€");
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/larder-test.db")
        );
    }

    #[test]
    fn test_invalid_plan_is_rejected() {
        let file = toml_file("plan = \"enterprise\"\n");
        let err = AppConfig::from_sources(File::from(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/larder.toml"))).is_err());
    }

    #[test]
    fn test_blank_tenant_is_rejected() {
        let missing = File::with_name("/nonexistent/larder").required(false);
        let err =
            AppConfig::from_sources(missing, env(&[("LARDER_TENANT_ID", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
