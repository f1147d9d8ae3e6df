use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: String,
    pub user_agent: String,
    pub accept_language: String,
    pub request_timeout_seconds: u64,
    /// Used when the price label carries no recognizable currency symbol.
    pub default_currency: String,
    /// Savings above this percentage turn the recommendation into "wait".
    pub wait_threshold_percent: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "price_history.db".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            request_timeout_seconds: 10,
            default_currency: "USD".to_string(),
            wait_threshold_percent: 10.0,
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config_or_default(path: &str) -> Result<AppConfig, ConfigError> {
    if Path::new(path).exists() {
        load_config(path)
    } else {
        tracing::info!("Config file {} not found, using defaults", path);
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{ "db_path": "test.db", "wait_threshold_percent": 5.0 }"#).unwrap();
        assert_eq!(cfg.db_path, "test.db");
        assert_eq!(cfg.wait_threshold_percent, 5.0);
        assert_eq!(cfg.default_currency, "USD");
        assert_eq!(cfg.request_timeout_seconds, 10);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config_or_default("definitely/not/here/config.json").unwrap();
        assert_eq!(cfg.db_path, AppConfig::default().db_path);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            serde_json::from_str::<AppConfig>("{ not json").map_err(ConfigError::from),
            Err(ConfigError::Parse(_))
        ));
    }
}
