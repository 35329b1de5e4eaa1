//! Environment-driven configuration

use crate::error::AnalyticsError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub port: u16,
    /// Deadline applied to each external call
    pub request_timeout: Duration,
    /// Directory for persisted history; `None` keeps history in memory
    pub history_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            history_dir: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT").or_else(|| non_empty("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                AnalyticsError::ConfigError(format!("invalid port '{}': {}", raw, e))
            })?,
            None => defaults.port,
        };

        let request_timeout = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    AnalyticsError::ConfigError(format!(
                        "invalid REQUEST_TIMEOUT_SECS '{}': {}",
                        raw, e
                    ))
                })?;
                if secs == 0 {
                    return Err(AnalyticsError::ConfigError(
                        "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_base_url),
            port,
            request_timeout,
            history_dir: non_empty("HISTORY_DIR").map(PathBuf::from),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(!config.has_api_key());
        assert!(config.history_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "abc"),
            ("API_PORT", "9090"),
            ("REQUEST_TIMEOUT_SECS", "15"),
            ("GEMINI_BASE_URL", "http://localhost:1234/models/"),
            ("HISTORY_DIR", "/tmp/analytica"),
        ]))
        .unwrap();

        assert_eq!(config.gemini_api_key.as_deref(), Some("abc"));
        assert_eq!(config.port, 9090);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.gemini_base_url, "http://localhost:1234/models");
        assert_eq!(config.history_dir, Some(PathBuf::from("/tmp/analytica")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_SECS", "0")])).is_err());
        // Blank key is treated as unset
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(!config.has_api_key());
    }
}
