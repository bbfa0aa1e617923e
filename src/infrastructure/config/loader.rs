use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, MAX_DURATION_SECS};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_FALLBACK_ENV: &str = "GEMINI_API_KEY";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid blend_priority: {0}. Must be between 0 and 1")]
    InvalidBlendPriority(f64),

    #[error("Invalid {0}: must be greater than zero")]
    ZeroValue(&'static str),

    #[error("Invalid {0}: {1} exceeds the maximum of {MAX_DURATION_SECS} seconds")]
    DurationTooLong(&'static str, u64),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .overload/config.yaml (project config, created by init)
    /// 3. .overload/local.yaml (project local overrides, optional)
    /// 4. Environment variables (OVERLOAD_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".overload")
    }

    /// Same precedence as [`ConfigLoader::load`], rooted at `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("OVERLOAD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        let config = Self::apply_api_key_fallback(config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        let config = Self::apply_api_key_fallback(config);
        Self::validate(&config)?;
        Ok(config)
    }

    fn apply_api_key_fallback(mut config: Config) -> Config {
        if config.ai.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            config.ai.api_key = std::env::var(API_KEY_FALLBACK_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        config
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
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
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        let blend = config.ai.blend_priority;
        if !(0.0..=1.0).contains(&blend) {
            return Err(ConfigError::InvalidBlendPriority(blend));
        }

        let non_zero: [(&'static str, u64); 7] = [
            ("ai.request_timeout_ms", config.ai.request_timeout_ms),
            ("limits.max_requests_per_day", u64::from(config.limits.max_requests_per_day)),
            ("limits.max_requests_per_hour", u64::from(config.limits.max_requests_per_hour)),
            (
                "limits.max_requests_per_user_per_day",
                u64::from(config.limits.max_requests_per_user_per_day),
            ),
            ("circuit_breaker.failure_threshold", u64::from(config.circuit_breaker.failure_threshold)),
            ("circuit_breaker.cooldown_secs", config.circuit_breaker.cooldown_secs),
            ("cache.suggestion_ttl_secs", config.cache.suggestion_ttl_secs),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroValue(*name));
        }

        let durations: [(&'static str, u64); 3] = [
            ("circuit_breaker.cooldown_secs", config.circuit_breaker.cooldown_secs),
            ("cache.suggestion_ttl_secs", config.cache.suggestion_ttl_secs),
            ("cache.provider_memo_ttl_secs", config.cache.provider_memo_ttl_secs),
        ];
        if let Some((name, value)) = durations.iter().find(|(_, value)| *value > MAX_DURATION_SECS) {
            return Err(ConfigError::DurationTooLong(*name, *value));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        ConfigLoader::validate(&Config::default()).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
ai:
  enabled: true
  blend_priority: 0.5
limits:
  max_requests_per_hour: 12
database:
  path: /custom/path.db
logging:
  level: debug
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert!(config.ai.enabled);
        assert!((config.ai.blend_priority - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.limits.max_requests_per_hour, 12);
        assert_eq!(config.limits.max_requests_per_day, 10);
        assert_eq!(config.database.path, "/custom/path.db");
        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_blend_priority_range() {
        let mut config = Config::default();
        config.ai.blend_priority = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidBlendPriority(_)
        ));
    }

    #[test]
    fn test_validate_zero_timeout_and_threshold() {
        let mut config = Config::default();
        config.ai.request_timeout_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ZeroValue("ai.request_timeout_ms")
        ));

        let mut config = Config::default();
        config.circuit_breaker.failure_threshold = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ZeroValue("circuit_breaker.failure_threshold")
        ));
    }

    #[test]
    fn test_validate_rejects_unbounded_durations() {
        let mut config = Config::default();
        config.circuit_breaker.cooldown_secs = u64::MAX;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::DurationTooLong("circuit_breaker.cooldown_secs", u64::MAX)
        ));

        let mut config = Config::default();
        config.cache.provider_memo_ttl_secs = MAX_DURATION_SECS + 1;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::DurationTooLong("cache.provider_memo_ttl_secs", _)
        ));

        let mut config = Config::default();
        config.cache.suggestion_ttl_secs = MAX_DURATION_SECS;
        ConfigLoader::validate(&config).expect("Ten-year TTL should be accepted");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 5_000;
        config.retry.max_backoff_ms = 1_000;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidBackoff(5_000, 1_000)
        ));
    }

    #[test]
    fn test_hierarchical_merging_with_env() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "ai:\n  enabled: true\n  model: gemini-pro\nlogging:\n  level: info\n  format: json\n",
        )
        .unwrap();
        fs::write(dir.path().join("local.yaml"), "logging:\n  level: debug\n").unwrap();

        temp_env::with_vars(
            [
                ("OVERLOAD_LIMITS__MAX_REQUESTS_PER_HOUR", Some("7")),
                ("OVERLOAD_AI__API_KEY", None),
                ("GEMINI_API_KEY", Some("AIzaFromEnv")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
                assert!(config.ai.enabled);
                assert_eq!(config.ai.model, "gemini-pro");
                assert_eq!(config.logging.level, "debug", "local.yaml should win");
                assert_eq!(config.logging.format, "json", "base value should persist");
                assert_eq!(config.limits.max_requests_per_hour, 7, "env should win");
                assert_eq!(config.ai.api_key.as_deref(), Some("AIzaFromEnv"));
            },
        );
    }

    #[test]
    fn test_configured_key_beats_fallback_env() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_vars(
            [
                ("OVERLOAD_AI__API_KEY", Some("AIzaConfigured")),
                ("GEMINI_API_KEY", Some("AIzaFromEnv")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
                assert_eq!(config.ai.api_key.as_deref(), Some("AIzaConfigured"));
            },
        );
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "ai:\n  blend_priority: 2.0\n").unwrap();
        temp_env::with_vars([("OVERLOAD_AI__BLEND_PRIORITY", None::<&str>)], || {
            assert!(ConfigLoader::load_from_dir(dir.path()).is_err());
        });
    }
}
