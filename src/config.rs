//! Runtime configuration
//!
//! Read from the environment at startup.

use std::time::Duration;

/// Planning service used when `RATION_API_BASE_URL` is unset
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Request timeout used when `RATION_HTTP_TIMEOUT_SECS` is unset or invalid
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the planning service, without trailing slash
    pub api_base_url: String,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build from `RATION_API_BASE_URL` and `RATION_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("RATION_API_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs = match lookup("RATION_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        "Ignoring invalid RATION_HTTP_TIMEOUT_SECS={:?}, using {}s",
                        raw,
                        DEFAULT_HTTP_TIMEOUT_SECS
                    );
                    DEFAULT_HTTP_TIMEOUT_SECS
                }
            },
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Self {
            api_base_url,
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("RATION_API_BASE_URL", "https://planner.example.org/api/"),
            ("RATION_HTTP_TIMEOUT_SECS", "3"),
        ]);
        assert_eq!(config.api_base_url, "https://planner.example.org/api");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config = config_from(&[("RATION_HTTP_TIMEOUT_SECS", "soon")]);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        let config = config_from(&[("RATION_HTTP_TIMEOUT_SECS", "0"), ("RATION_API_BASE_URL", " ")]);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }
}
