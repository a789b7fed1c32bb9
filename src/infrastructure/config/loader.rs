use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::EngineConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid platform api_endpoint '{0}': {1}")]
    InvalidPlatformEndpoint(String, url::ParseError),

    #[error("Invalid dashboard api_endpoint '{0}': {1}")]
    InvalidDashboardEndpoint(String, url::ParseError),

    #[error("Invalid poll interval: {0}. Must be at least 1 second")]
    InvalidPollInterval(u64),

    #[error("Collector base_config_path cannot be empty")]
    EmptyBaseConfigPath,

    #[error("Collector target_config_path cannot be empty")]
    EmptyTargetConfigPath,

    #[error("Collector process_name cannot be empty")]
    EmptyProcessName,

    #[error("Datastore offering, plan, and instance_name cannot be empty")]
    EmptyDatastoreField,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. vigil.yaml in the working directory
    /// 3. Environment variables (VIGIL_* prefix, highest priority)
    ///
    /// The env layer is what deployed components run from: the provisioner
    /// stamps `VIGIL_*` variables into their manifests.
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file("vigil.yaml"))
            .merge(Env::prefixed("VIGIL_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, env overrides still applied.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("VIGIL_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
        if !config.platform.api_endpoint.is_empty() {
            url::Url::parse(&config.platform.api_endpoint).map_err(|err| {
                ConfigError::InvalidPlatformEndpoint(config.platform.api_endpoint.clone(), err)
            })?;
        }
        if !config.dashboard.api_endpoint.is_empty() {
            url::Url::parse(&config.dashboard.api_endpoint).map_err(|err| {
                ConfigError::InvalidDashboardEndpoint(config.dashboard.api_endpoint.clone(), err)
            })?;
        }

        if config.collector.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(
                config.collector.poll_interval_secs,
            ));
        }
        if config.dashboard.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(
                config.dashboard.poll_interval_secs,
            ));
        }

        if config.collector.base_config_path.is_empty() {
            return Err(ConfigError::EmptyBaseConfigPath);
        }
        if config.collector.target_config_path.is_empty() {
            return Err(ConfigError::EmptyTargetConfigPath);
        }
        if config.collector.process_name.is_empty() {
            return Err(ConfigError::EmptyProcessName);
        }

        if config.datastore.offering.is_empty()
            || config.datastore.plan.is_empty()
            || config.datastore.instance_name.is_empty()
        {
            return Err(ConfigError::EmptyDatastoreField);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let mut config = EngineConfig::default();
        config.platform.api_endpoint = "not a url".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidPlatformEndpoint(..)
        ));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = EngineConfig::default();
        config.collector.poll_interval_secs = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidPollInterval(0)
        ));
    }

    #[test]
    fn validate_rejects_empty_target_path() {
        let mut config = EngineConfig::default();
        config.collector.target_config_path = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::EmptyTargetConfigPath
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = EngineConfig::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other}"),
        }
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = EngineConfig::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn file_overrides_defaults() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "platform:\n  api_endpoint: https://api.platform.example\ncollector:\n  poll_interval_secs: 15"
        )
        .unwrap();
        file.flush().unwrap();

        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.platform.api_endpoint, "https://api.platform.example");
        assert_eq!(config.collector.poll_interval_secs, 15);
        assert_eq!(
            config.collector.process_name, "prometheus",
            "untouched fields keep their defaults"
        );
    }
}
