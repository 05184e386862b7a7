//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration, read from `PROP_ASSIST_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the REST/WS surface listens on.
    pub listen_port: u16,
    /// Base URL of the categorizer feed read store (also serves `/refresh`).
    pub feed_base_url: String,
    /// Base URL of the email-drafting service.
    pub drafter_base_url: String,
    /// Timeout applied to every outbound HTTP call.
    pub http_timeout: Duration,
    /// Lower bound of the simulated worker-location search delay.
    pub search_delay_min: Duration,
    /// Upper bound of the simulated worker-location search delay.
    pub search_delay_max: Duration,
    /// Additional attempts after a failed draft request (0 = no retry).
    pub draft_max_retries: u32,
    /// Base backoff between draft retries (grows linearly per attempt).
    pub draft_retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            feed_base_url: "http://localhost:8000".to_string(),
            drafter_base_url: "http://localhost:8000".to_string(),
            http_timeout: Duration::from_secs(10),
            search_delay_min: Duration::from_secs(2),
            search_delay_max: Duration::from_secs(4),
            draft_max_retries: 2,
            draft_retry_backoff: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults for
    /// unset variables. A set variable that fails to parse is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            listen_port: parse_env("PROP_ASSIST_PORT", defaults.listen_port)?,
            feed_base_url: env_or("PROP_ASSIST_FEED_URL", defaults.feed_base_url),
            drafter_base_url: env_or("PROP_ASSIST_DRAFTER_URL", defaults.drafter_base_url),
            http_timeout: Duration::from_secs(parse_env(
                "PROP_ASSIST_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            search_delay_min: Duration::from_millis(parse_env(
                "PROP_ASSIST_SEARCH_DELAY_MIN_MS",
                defaults.search_delay_min.as_millis() as u64,
            )?),
            search_delay_max: Duration::from_millis(parse_env(
                "PROP_ASSIST_SEARCH_DELAY_MAX_MS",
                defaults.search_delay_max.as_millis() as u64,
            )?),
            draft_max_retries: parse_env("PROP_ASSIST_DRAFT_MAX_RETRIES", defaults.draft_max_retries)?,
            draft_retry_backoff: Duration::from_millis(parse_env(
                "PROP_ASSIST_DRAFT_RETRY_BACKOFF_MS",
                defaults.draft_retry_backoff.as_millis() as u64,
            )?),
        };

        if config.search_delay_min > config.search_delay_max {
            return Err(ConfigError::InvalidValue {
                key: "PROP_ASSIST_SEARCH_DELAY_MIN_MS".to_string(),
                message: format!(
                    "minimum delay {:?} exceeds maximum {:?}",
                    config.search_delay_min, config.search_delay_max
                ),
            });
        }

        Ok(config)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
