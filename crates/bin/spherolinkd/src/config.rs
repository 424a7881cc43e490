//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `spherolink.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use spherolink_adapter_ble::BleConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which robot to look for.
    pub robot: RobotConfig,
    /// Periodic telemetry requests.
    pub telemetry: TelemetryConfig,
    /// Host adapter settings.
    pub ble: BleConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Target device selection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Advertised-name prefix of the robot to connect to.
    pub target_prefix: String,
}

/// Telemetry polling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seconds between RSSI + power-state requests while ready.
    pub poll_interval_secs: u64,
    /// Ask for the firmware version as soon as the session is ready.
    pub request_version_on_ready: bool,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `spherolink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, if an
    /// override cannot be parsed, or if the resulting configuration fails
    /// validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("spherolink.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("SPHEROLINK_TARGET") {
            self.robot.target_prefix = val;
        }
        if let Some(val) = var("SPHEROLINK_POLL_SECS") {
            self.telemetry.poll_interval_secs = val.parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "SPHEROLINK_POLL_SECS must be a number of seconds, got {val:?}"
                ))
            })?;
        }
        if let Some(val) = var("SPHEROLINK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.robot.target_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "target prefix must not be empty".to_string(),
            ));
        }
        if self.telemetry.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        if self.ble.event_buffer == 0 {
            return Err(ConfigError::Validation(
                "event buffer must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Telemetry poll period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry.poll_interval_secs)
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            target_prefix: "BB".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            request_version_on_ready: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "spherolinkd=info,spherolink=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.robot.target_prefix, "BB");
        assert_eq!(config.telemetry.poll_interval_secs, 5);
        assert!(config.telemetry.request_version_on_ready);
        assert_eq!(config.ble.adapter_index, 0);
        assert_eq!(config.ble.event_buffer, 64);
        assert_eq!(config.logging.filter, "spherolinkd=info,spherolink=info");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.robot.target_prefix, "BB");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [robot]
            target_prefix = 'SK'

            [telemetry]
            poll_interval_secs = 10
            request_version_on_ready = false

            [ble]
            adapter_index = 1
            event_buffer = 16
            write_with_response = false

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.robot.target_prefix, "SK");
        assert_eq!(config.telemetry.poll_interval_secs, 10);
        assert!(!config.telemetry.request_version_on_ready);
        assert_eq!(config.ble.adapter_index, 1);
        assert_eq!(config.ble.event_buffer, 16);
        assert!(!config.ble.write_with_response);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [telemetry]
            poll_interval_secs = 2
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.telemetry.poll_interval_secs, 2);
        assert!(config.telemetry.request_version_on_ready);
        assert_eq!(config.robot.target_prefix, "BB");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.robot.target_prefix, "BB");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("SPHEROLINK_TARGET", "2B"),
                ("SPHEROLINK_POLL_SECS", "30"),
                ("SPHEROLINK_LOG", "trace"),
            ]))
            .unwrap();
        assert_eq!(config.robot.target_prefix, "2B");
        assert_eq!(config.telemetry.poll_interval_secs, 30);
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_prefer_rust_log_over_spherolink_log() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("SPHEROLINK_LOG", "trace"), ("RUST_LOG", "warn")]))
            .unwrap();
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_reject_unparsable_poll_interval() {
        let mut config = Config::default();
        let result = config.apply_overrides(env(&[("SPHEROLINK_POLL_SECS", "soon")]));
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("soon")));
        assert_eq!(config.telemetry.poll_interval_secs, 5);
    }

    #[test]
    fn should_reject_empty_target_prefix() {
        let mut config = Config::default();
        config.robot.target_prefix = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_poll_interval() {
        let mut config = Config::default();
        config.telemetry.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_event_buffer() {
        let mut config = Config::default();
        config.ble.event_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_convert_poll_interval_to_duration() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }
}
