use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{MonitorError, Result};

/// Runtime settings, built once at startup and handed to the client,
/// the fetch scheduler and the dashboard.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub consumer_rpc_url: String,
    pub provider_rest_url: Option<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub consumer_page_size: u32,
    pub scheduler: SchedulerConfig,
    /// Outcomes kept per validator. `0` keeps every block of the session.
    pub history_capacity: usize,
    pub input_tick_ms: u64,
    pub log_file: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub initial_poll_interval_secs: f64,
    pub poll_step_secs: f64,
    pub min_poll_interval_secs: f64,
    pub block_time_window: usize,
    pub initial_block_time_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_poll_interval_secs: 2.0,
            poll_step_secs: 0.5,
            min_poll_interval_secs: 1.0,
            block_time_window: 10,
            initial_block_time_secs: 1.0,
        }
    }
}

impl SchedulerConfig {
    fn validate(&self) -> Result<()> {
        let durations = [
            ("initial_poll_interval_secs", self.initial_poll_interval_secs),
            ("poll_step_secs", self.poll_step_secs),
            ("min_poll_interval_secs", self.min_poll_interval_secs),
            ("initial_block_time_secs", self.initial_block_time_secs),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value <= 0.0 {
                return Err(MonitorError::Config(format!(
                    "scheduler.{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            consumer_rpc_url: String::new(),
            provider_rest_url: None,
            user_agent: "cli-chain-monitor".to_string(),
            request_timeout_secs: 10,
            consumer_page_size: 100,
            scheduler: SchedulerConfig::default(),
            history_capacity: 4096,
            input_tick_ms: 100,
            log_file: "chain-monitor.log".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load settings from a TOML file. Keys that are absent keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| MonitorError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the fetch loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;
        if self.consumer_page_size == 0 {
            return Err(MonitorError::Config("consumer_page_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn input_tick(&self) -> Duration {
        Duration::from_millis(self.input_tick_ms)
    }

    /// Provider lookups are only possible when a provider endpoint was given.
    pub fn reconciliation_enabled(&self) -> bool {
        self.provider_rest_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "consumer_rpc_url = \"http://localhost:26657\"\nhistory_capacity = 0\n\n[scheduler]\npoll_step_secs = 0.25"
        )
        .unwrap();

        let config = MonitorConfig::load(file.path()).unwrap();
        assert_eq!(config.consumer_rpc_url, "http://localhost:26657");
        assert_eq!(config.history_capacity, 0);
        assert_eq!(config.scheduler.poll_step_secs, 0.25);
        assert_eq!(config.scheduler.initial_poll_interval_secs, 2.0);
        assert_eq!(config.user_agent, "cli-chain-monitor");
        assert!(!config.reconciliation_enabled());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MonitorConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_finite_intervals_are_rejected() {
        for body in [
            "[scheduler]\ninitial_poll_interval_secs = inf",
            "[scheduler]\npoll_step_secs = nan",
            "[scheduler]\nmin_poll_interval_secs = -1.0",
            "[scheduler]\ninitial_block_time_secs = 0.0",
        ] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "{}", body).unwrap();
            let result = MonitorConfig::load(file.path());
            assert!(matches!(result, Err(MonitorError::Config(_))), "accepted {:?}", body);
        }
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_capacity = \"lots\"").unwrap();
        assert!(matches!(MonitorConfig::load(file.path()), Err(MonitorError::Config(_))));
    }
}
