use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::WaitError;
use crate::probe::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::waiter::WaitSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaiterConfig {
    pub timeout_secs: f64,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub log_level: Option<String>,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30.0,
            poll_interval_ms: 500,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            log_level: Some("info".to_string()),
        }
    }
}

impl WaiterConfig {
    pub fn validate(&self) -> Result<()> {
        self.wait_spec()?;

        if self.connect_timeout_ms == 0 {
            return Err(anyhow::anyhow!("connect_timeout_ms must be greater than 0"));
        }

        Ok(())
    }

    pub fn wait_spec(&self) -> Result<WaitSpec, WaitError> {
        WaitSpec::from_secs_f64(self.timeout_secs)?.with_poll_interval(self.poll_interval())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// The numeric arguments must be registered with typed value parsers
    /// (`f64` for `timeout`, `u64` for `interval` and `connect-timeout`).
    pub fn apply_cli_overrides(&mut self, matches: &ArgMatches) {
        if let Some(timeout) = matches.get_one::<f64>("timeout") {
            self.timeout_secs = *timeout;
        }

        if let Some(interval) = matches.get_one::<u64>("interval") {
            self.poll_interval_ms = *interval;
        }

        if let Some(connect) = matches.get_one::<u64>("connect-timeout") {
            self.connect_timeout_ms = *connect;
        }

        if let Some(log_level) = matches.get_one::<String>("log-level") {
            self.log_level = Some(log_level.clone());
        }
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = parse_override(&lookup, "CONDWAIT_TIMEOUT_SECS")? {
            self.timeout_secs = timeout;
        }

        if let Some(interval) = parse_override(&lookup, "CONDWAIT_POLL_INTERVAL_MS")? {
            self.poll_interval_ms = interval;
        }

        if let Some(connect) = parse_override(&lookup, "CONDWAIT_CONNECT_TIMEOUT_MS")? {
            self.connect_timeout_ms = connect;
        }

        if let Some(log_level) = lookup("CONDWAIT_LOG_LEVEL") {
            self.log_level = Some(log_level);
        }

        Ok(())
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid {key} value '{raw}'"))
        })
        .transpose()
}

/// Load configuration: CLI args > env vars > config file > defaults
pub fn load_config(config_path: Option<&str>, matches: &ArgMatches) -> Result<WaiterConfig> {
    let mut config = read_config_file(config_path)?;

    config.apply_env_overrides()?;
    config.apply_cli_overrides(matches);

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    log::debug!("Final config: {config:?}");

    Ok(config)
}

fn read_config_file(config_path: Option<&str>) -> Result<WaiterConfig> {
    let Some(path) = config_path else {
        return Ok(WaiterConfig::default());
    };

    if !Path::new(path).exists() {
        log::debug!("Config file not found: {path}, using defaults");
        return Ok(WaiterConfig::default());
    }

    let file_content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {path}"))?;
    let config: WaiterConfig = toml::from_str(&file_content)
        .with_context(|| format!("Failed to parse config file: {path}"))?;

    log::info!("Loaded configuration from file: {path}");
    Ok(config)
}

/// Create a sample configuration file
pub fn create_sample_config(path: &str) -> Result<()> {
    let config = WaiterConfig::default();
    let toml_content =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    fs::write(path, toml_content)
        .with_context(|| format!("Failed to write sample config to: {path}"))?;

    Ok(())
}
