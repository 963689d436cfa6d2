use std::path::PathBuf;

use printlab_pipeline::MergeFailurePolicy;
use printlab_printful::{ClientConfig, ConfigError};

/// Everything the `printlab` binary reads from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    /// Font file for text assets; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    pub merge_policy: MergeFailurePolicy,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Backend variables are documented on [`ClientConfig::from_env`].
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `PRINTLAB_FONT_PATH`      | unset   |
    /// | `PRINTLAB_MERGE_FALLBACK` | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let client = ClientConfig::from_lookup(&lookup)?;

        let font_path = lookup("PRINTLAB_FONT_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let fallback = match lookup("PRINTLAB_MERGE_FALLBACK") {
            None => false,
            Some(value) => parse_flag(&value).ok_or(ConfigError {
                var: "PRINTLAB_MERGE_FALLBACK",
                expected: "true or false",
                value,
            })?,
        };

        Ok(Self {
            client,
            font_path,
            merge_policy: if fallback {
                MergeFailurePolicy::FallbackToLatest
            } else {
                MergeFailurePolicy::Surface
            },
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_surface_merge_failures() {
        let config = load(&[]).unwrap();
        assert_eq!(config.merge_policy, MergeFailurePolicy::Surface);
        assert!(config.font_path.is_none());
        assert_eq!(config.client.poll.max_attempts, 30);
    }

    #[test]
    fn fallback_flag_selects_latest_policy() {
        let config = load(&[("PRINTLAB_MERGE_FALLBACK", "TRUE")]).unwrap();
        assert_eq!(config.merge_policy, MergeFailurePolicy::FallbackToLatest);
    }

    #[test]
    fn bad_flag_names_the_variable() {
        let err = load(&[("PRINTLAB_MERGE_FALLBACK", "maybe")]).unwrap_err();
        assert_eq!(err.var, "PRINTLAB_MERGE_FALLBACK");
    }

    #[test]
    fn font_path_is_read() {
        let config = load(&[("PRINTLAB_FONT_PATH", "/fonts/Inter.ttf")]).unwrap();
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/Inter.ttf")));
    }
}
