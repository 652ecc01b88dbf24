use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Engine name cannot be empty")]
    EmptyEngineName,

    #[error("Results path cannot be empty")]
    EmptyResultsPath,

    #[error("Invalid poll interval: {0}. Must be positive")]
    InvalidPollInterval(f64),

    #[error("Invalid tracker kind: {0}. Must be one of: local, sge")]
    InvalidTrackerKind(String),

    #[error("Tracker kind sge requires tracker.sge_user")]
    MissingSgeUser,

    #[error("Channel name cannot be empty")]
    EmptyChannelName,

    #[error("Invalid greediness: {0}. Must be between 0.0 and 1.0")]
    InvalidGreediness(f64),

    #[error("Invalid max_attempts: {0}. Cannot be 0")]
    InvalidMaxAttempts(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .gridforge/config.yaml (project config)
    /// 3. .gridforge/local.yaml (project local overrides, optional)
    /// 4. Environment variables (GRIDFORGE_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.gridforge/) so several
    /// sweeps on one machine can point at different clusters and channels.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".gridforge/config.yaml"))
            .merge(Yaml::file(".gridforge/local.yaml"))
            .merge(Env::prefixed("GRIDFORGE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("GRIDFORGE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.engine.name.is_empty() {
            return Err(ConfigError::EmptyEngineName);
        }

        if config.engine.results_path.is_empty() {
            return Err(ConfigError::EmptyResultsPath);
        }

        if config.engine.poll_interval_secs <= 0.0 {
            return Err(ConfigError::InvalidPollInterval(
                config.engine.poll_interval_secs,
            ));
        }

        let valid_tracker_kinds = ["local", "sge"];
        if !valid_tracker_kinds.contains(&config.tracker.kind.as_str()) {
            return Err(ConfigError::InvalidTrackerKind(config.tracker.kind.clone()));
        }

        if config.tracker.kind == "sge" && config.tracker.sge_user.is_empty() {
            return Err(ConfigError::MissingSgeUser);
        }

        if config.channel.channel.is_empty() {
            return Err(ConfigError::EmptyChannelName);
        }

        if !(0.0..=1.0).contains(&config.queue.greediness) {
            return Err(ConfigError::InvalidGreediness(config.queue.greediness));
        }

        if config.queue.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.queue.max_attempts));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}
