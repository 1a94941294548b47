use std::time::Duration;

use crate::{DataMode, Error, Result};

const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";

/// Process configuration loaded from environment variables at startup.
///
/// Instrument lists and rule parameters live in the scanner TOML file
/// (see `strategy::ScannerFileConfig`); this struct only covers the runtime.
#[derive(Debug, Clone)]
pub struct Config {
    // Market data
    pub data_mode: DataMode,
    pub replay_dir: String,
    pub binance_base_url: String,
    pub http_timeout: Duration,

    // Dashboard
    pub dashboard_port: u16,

    // Scanner config file path
    pub scanner_config_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present. Every variable has a default.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let data_mode = match optional_env("DATA_MODE")
            .unwrap_or_else(|| "live".to_string())
            .to_lowercase()
            .as_str()
        {
            "live" => DataMode::Live,
            "replay" => DataMode::Replay,
            other => {
                return Err(Error::Config(format!(
                    "DATA_MODE must be 'live' or 'replay', got: '{other}'"
                )))
            }
        };

        let http_timeout_secs: u64 = parse_env("HTTP_TIMEOUT_SECS")?.unwrap_or(10);
        if http_timeout_secs == 0 {
            return Err(Error::Config("HTTP_TIMEOUT_SECS must be > 0".into()));
        }

        // PORT is honoured for platform deployments that inject it.
        let dashboard_port = match parse_env("DASHBOARD_PORT")? {
            Some(port) => port,
            None => parse_env("PORT")?.unwrap_or(8050),
        };

        Ok(Config {
            data_mode,
            replay_dir: optional_env("REPLAY_DIR").unwrap_or_else(|| "data/replay".to_string()),
            binance_base_url: optional_env("BINANCE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BINANCE_URL.to_string()),
            http_timeout: Duration::from_secs(http_timeout_secs),
            dashboard_port,
            scanner_config_path: optional_env("SCANNER_CONFIG_PATH")
                .unwrap_or_else(|| "config/scanner.toml".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
        None => Ok(None),
    }
}
