use crate::errors::{PlatformCliError, Result};
use crate::shared::constants::{
    DEFAULT_API_URL, DEFAULT_LOG_DIR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, test maps)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("PLATFORM_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let poll_interval = parse_seconds(
            "PLATFORM_POLL_INTERVAL",
            non_empty("PLATFORM_POLL_INTERVAL"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let request_timeout = parse_seconds(
            "PLATFORM_REQUEST_TIMEOUT",
            non_empty("PLATFORM_REQUEST_TIMEOUT"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Config {
            api_url,
            api_token: non_empty("PLATFORM_API_TOKEN"),
            project: non_empty("PLATFORM_PROJECT"),
            environment: non_empty("PLATFORM_ENVIRONMENT"),
            poll_interval,
            request_timeout,
        })
    }

    /// Project from the command line, falling back to the configured default
    pub fn resolve_project(&self, cli_value: Option<String>) -> Result<String> {
        cli_value.or_else(|| self.project.clone()).ok_or_else(|| {
            PlatformCliError::ConfigurationError(
                "No project specified (use --project or PLATFORM_PROJECT)".to_string(),
            )
        })
    }

    /// Environment from the command line, falling back to the configured default
    pub fn resolve_environment(&self, cli_value: Option<String>) -> Result<String> {
        cli_value.or_else(|| self.environment.clone()).ok_or_else(|| {
            PlatformCliError::ConfigurationError(
                "No environment specified (use --environment or PLATFORM_ENVIRONMENT)"
                    .to_string(),
            )
        })
    }
}

/// Directory for the rolling log file, read before the rest of the configuration
pub fn log_dir() -> PathBuf {
    env::var("PLATFORM_LOG_DIR")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

fn parse_seconds(key: &str, value: Option<String>, default: u64) -> Result<Duration> {
    let secs = match value {
        None => default,
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            PlatformCliError::ConfigurationError(format!(
                "{} must be a whole number of seconds, got '{}'",
                key, raw
            ))
        })?,
    };

    if secs == 0 {
        return Err(PlatformCliError::ConfigurationError(format!(
            "{} must be greater than zero",
            key
        )));
    }

    Ok(Duration::from_secs(secs))
}
