use std::time::Duration;

use crate::poll::PollConfig;

/// Default backend base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default path of the shared file-upload endpoint.
pub const DEFAULT_UPLOAD_PATH: &str = "/api/upload";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Path of the upload endpoint, appended to `api_url`.
    pub upload_path: String,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Mockup-status polling budget.
    pub poll: PollConfig,
}

/// A configuration variable held an unusable value.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected} (got '{value}')")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll: PollConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                  |
    /// |----------------------------------|--------------------------|
    /// | `PRINTLAB_API_URL`               | `NEXT_PUBLIC_API_URL`, then `http://localhost:5000` |
    /// | `PRINTLAB_UPLOAD_PATH`           | `/api/upload`            |
    /// | `PRINTLAB_REQUEST_TIMEOUT_SECS`  | `30`                     |
    /// | `PRINTLAB_POLL_MAX_ATTEMPTS`     | `30`                     |
    /// | `PRINTLAB_POLL_INTERVAL_MS`      | `2000`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = lookup("PRINTLAB_API_URL")
            .or_else(|| lookup("NEXT_PUBLIC_API_URL"))
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let mut upload_path = lookup("PRINTLAB_UPLOAD_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.upload_path);
        if !upload_path.starts_with('/') {
            upload_path.insert(0, '/');
        }

        let timeout_secs: u64 = parse_var(
            &lookup,
            "PRINTLAB_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
            "a whole number of seconds",
        )?;

        let max_attempts: u32 = parse_var(
            &lookup,
            "PRINTLAB_POLL_MAX_ATTEMPTS",
            defaults.poll.max_attempts,
            "a positive integer",
        )?;
        if max_attempts == 0 {
            return Err(ConfigError {
                var: "PRINTLAB_POLL_MAX_ATTEMPTS",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        let interval_ms: u64 = parse_var(
            &lookup,
            "PRINTLAB_POLL_INTERVAL_MS",
            defaults.poll.interval.as_millis() as u64,
            "a whole number of milliseconds",
        )?;

        Ok(Self {
            api_url,
            upload_path,
            request_timeout: Duration::from_secs(timeout_secs),
            poll: PollConfig {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            expected,
            value,
        }),
        None => Ok(default),
    }
}
