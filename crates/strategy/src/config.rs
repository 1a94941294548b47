use std::time::Duration;

use common::{Error, Result, Timeframe};
use serde::{Deserialize, Serialize};

use crate::signals::SignalParams;

/// Scanner config file (TOML). Loaded once at startup.
///
/// Example `config/scanner.toml`:
/// ```toml
/// instruments = ["BTCUSDT", "ETHUSDT"]
/// higher_timeframe = "1h"
/// lower_timeframe = "15m"
/// candle_limit = 300
/// refresh_secs = 900
/// rr_trend = 2.0
/// rr_range = 1.5
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerFileConfig {
    /// Venue symbols, e.g. "BTCUSDT". Evaluated in this order.
    pub instruments: Vec<String>,
    /// Timeframe used for regime detection.
    #[serde(default = "default_higher_timeframe")]
    pub higher_timeframe: Timeframe,
    /// Timeframe used for candle bias, levels and signals.
    #[serde(default = "default_lower_timeframe")]
    pub lower_timeframe: Timeframe,
    /// Candles requested per (instrument, timeframe).
    #[serde(default = "default_candle_limit")]
    pub candle_limit: usize,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Reward multiple for trend-pullback entries.
    #[serde(default = "default_rr_trend")]
    pub rr_trend: f64,
    /// Reward multiple for range-bounce entries.
    #[serde(default = "default_rr_range")]
    pub rr_range: f64,
}

fn default_higher_timeframe() -> Timeframe {
    Timeframe::H1
}

fn default_lower_timeframe() -> Timeframe {
    Timeframe::M15
}

fn default_candle_limit() -> usize {
    300
}

fn default_refresh_secs() -> u64 {
    900
}

fn default_rr_trend() -> f64 {
    SignalParams::default().rr_trend
}

fn default_rr_range() -> f64 {
    SignalParams::default().rr_range
}

pub const DEFAULT_INSTRUMENTS: [&str; 26] = [
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "AVAXUSDT", "LINKUSDT", "XRPUSDT", "TRXUSDT",
    "ZECUSDT", "ATOMUSDT", "TRUMPUSDT", "SUIUSDT", "DOGEUSDT", "DOTUSDT", "ADAUSDT", "LUNCUSDT",
    "AAVEUSDT", "DASHUSDT", "LTCUSDT", "XTZUSDT", "TURTLEUSDT", "INJUSDT", "ICPUSDT", "TONUSDT",
    "USDTUSD", "SHIBUSDT",
];

impl Default for ScannerFileConfig {
    fn default() -> Self {
        Self {
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
            higher_timeframe: default_higher_timeframe(),
            lower_timeframe: default_lower_timeframe(),
            candle_limit: default_candle_limit(),
            refresh_secs: default_refresh_secs(),
            rr_trend: default_rr_trend(),
            rr_range: default_rr_range(),
        }
    }
}

impl ScannerFileConfig {
    /// Load and validate a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read scanner config at '{path}': {e}")))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("invalid scanner config at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(Error::Config("instrument list is empty".into()));
        }
        if let Some(blank) = self.instruments.iter().find(|s| s.trim().is_empty()) {
            return Err(Error::Config(format!("blank instrument symbol: '{blank}'")));
        }
        if self.higher_timeframe <= self.lower_timeframe {
            return Err(Error::Config(format!(
                "higher_timeframe ({}) must be longer than lower_timeframe ({})",
                self.higher_timeframe, self.lower_timeframe
            )));
        }
        if self.candle_limit == 0 {
            return Err(Error::Config("candle_limit must be > 0".into()));
        }
        if self.refresh_secs == 0 {
            return Err(Error::Config("refresh_secs must be > 0".into()));
        }
        if !(self.rr_trend > 0.0 && self.rr_range > 0.0) {
            return Err(Error::Config(format!(
                "reward multiples must be positive, got rr_trend={} rr_range={}",
                self.rr_trend, self.rr_range
            )));
        }
        Ok(())
    }

    pub fn signal_params(&self) -> SignalParams {
        SignalParams {
            rr_trend: self.rr_trend,
            rr_range: self.rr_range,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_takes_defaults() {
        let cfg = ScannerFileConfig::from_toml_str(r#"instruments = ["BTCUSDT"]"#).unwrap();
        assert_eq!(cfg.higher_timeframe, Timeframe::H1);
        assert_eq!(cfg.lower_timeframe, Timeframe::M15);
        assert_eq!(cfg.candle_limit, 300);
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(900));
        assert_eq!(cfg.signal_params(), SignalParams::default());
    }

    #[test]
    fn full_file_parses() {
        let cfg = ScannerFileConfig::from_toml_str(
            r#"
            instruments = ["ETHUSDT", "SOLUSDT"]
            higher_timeframe = "4h"
            lower_timeframe = "1h"
            candle_limit = 500
            refresh_secs = 60
            rr_trend = 3.0
            rr_range = 1.25
            "#,
        )
        .unwrap();
        assert_eq!(cfg.instruments, vec!["ETHUSDT", "SOLUSDT"]);
        assert_eq!(cfg.higher_timeframe, Timeframe::H4);
        assert_eq!(cfg.signal_params().rr_range, 1.25);
    }

    #[test]
    fn rejects_empty_instruments() {
        assert!(ScannerFileConfig::from_toml_str("instruments = []").is_err());
    }

    #[test]
    fn rejects_inverted_timeframes() {
        let err = ScannerFileConfig::from_toml_str(
            r#"
            instruments = ["BTCUSDT"]
            higher_timeframe = "15m"
            lower_timeframe = "1h"
            "#,
        );
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn rejects_non_positive_reward_multiple() {
        let err = ScannerFileConfig::from_toml_str(
            r#"
            instruments = ["BTCUSDT"]
            rr_trend = 0.0
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn rejects_unknown_timeframe_token() {
        let err = ScannerFileConfig::from_toml_str(
            r#"
            instruments = ["BTCUSDT"]
            lower_timeframe = "7m"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = ScannerFileConfig::default();
        assert_eq!(cfg.instruments.len(), 26);
        cfg.validate().unwrap();
    }
}
