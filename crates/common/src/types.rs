use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar. `time` is the bucket's open time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// High minus low. Zero for a flat bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Candle bucket duration, named by the venue's interval token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }

    pub fn duration_secs(&self) -> u64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M3 => 180,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1_800,
            Timeframe::H1 => 3_600,
            Timeframe::H2 => 7_200,
            Timeframe::H4 => 14_400,
            Timeframe::H6 => 21_600,
            Timeframe::H12 => 43_200,
            Timeframe::D1 => 86_400,
            Timeframe::W1 => 604_800,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Timeframe::M1),
            "3m" => Ok(Timeframe::M3),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" => Ok(Timeframe::H1),
            "2h" => Ok(Timeframe::H2),
            "4h" => Ok(Timeframe::H4),
            "6h" => Ok(Timeframe::H6),
            "12h" => Ok(Timeframe::H12),
            "1d" => Ok(Timeframe::D1),
            "1w" => Ok(Timeframe::W1),
            other => Err(format!("unknown timeframe token '{other}'")),
        }
    }
}

/// Coarse trend classification from the higher timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Uptrend,
    Range,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Uptrend => write!(f, "UPTREND"),
            Regime::Range => write!(f, "RANGE"),
        }
    }
}

/// Where a candle closed within its high-low range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CandleBias {
    Bullish,
    Bearish,
    Range,
    /// Flat candle (high == low).
    Neutral,
}

impl fmt::Display for CandleBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandleBias::Bullish => write!(f, "BULLISH"),
            CandleBias::Bearish => write!(f, "BEARISH"),
            CandleBias::Range => write!(f, "RANGE"),
            CandleBias::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Which BUY rule fired. Rules are tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuySetup {
    TrendPullback,
    RangeBounce,
}

impl BuySetup {
    pub fn reason(&self) -> &'static str {
        match self {
            BuySetup::TrendPullback => "Uptrend + EMA50 pullback + bullish close",
            BuySetup::RangeBounce => "Range support + MACD rising + neutral close",
        }
    }
}

/// Which SELL condition fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellTrigger {
    /// Uptrend, but price lost the 50 average or the candle closed bearish.
    TrendBreakdown,
    /// Ranging and the MACD histogram went below zero.
    MomentumNegative,
}

impl SellTrigger {
    pub fn reason(&self) -> &'static str {
        match self {
            SellTrigger::TrendBreakdown => "EMA50 loss or bearish close",
            SellTrigger::MomentumNegative => "MACD turned negative",
        }
    }
}

/// Display-ready BUY advisory. Prices are rounded to 4 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyAdvisory {
    pub setup: BuySetup,
    pub reason: String,
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellAdvisory {
    pub trigger: SellTrigger,
    pub reason: String,
}

/// One instrument's row for a single scan pass.
///
/// Numeric fields are presentation values: prices rounded to 4 decimals,
/// `close_pct` to 1 decimal. None of them feed back into decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Display label, e.g. "BTC" for "BTCUSDT".
    pub symbol: String,
    pub price: f64,
    pub regime: Regime,
    pub high: f64,
    pub low: f64,
    pub range: f64,
    pub close_pct: f64,
    pub candle: CandleBias,
    pub buy: Option<BuyAdvisory>,
    pub sell: Option<SellAdvisory>,
    /// Link to the instrument's page on the venue.
    pub chart: String,
}

/// Output of one scan pass. Never merged with an earlier pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<EvaluationResult>,
    /// Symbols omitted from this pass because their evaluation failed.
    pub failed: Vec<String>,
}

/// Where candle data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    Live,
    Replay,
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMode::Live => write!(f, "live"),
            DataMode::Replay => write!(f, "replay"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_token_roundtrips_through_display() {
        for token in ["1m", "15m", "1h", "4h", "1d", "1w"] {
            let tf: Timeframe = token.parse().unwrap();
            assert_eq!(tf.to_string(), token);
        }
        assert!("H1".parse::<Timeframe>().is_err());
    }

    #[test]
    fn timeframe_serializes_as_token() {
        let json = serde_json::to_string(&Timeframe::M15).unwrap();
        assert_eq!(json, "\"15m\"");
        let tf: Timeframe = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(tf, Timeframe::H1);
    }

    #[test]
    fn timeframe_ordering_follows_duration() {
        assert!(Timeframe::H1 > Timeframe::M15);
        assert!(Timeframe::H1.duration_secs() > Timeframe::M15.duration_secs());
    }

    #[test]
    fn labels_serialize_uppercase() {
        assert_eq!(serde_json::to_string(&Regime::Uptrend).unwrap(), "\"UPTREND\"");
        assert_eq!(serde_json::to_string(&CandleBias::Neutral).unwrap(), "\"NEUTRAL\"");
        assert_eq!(
            serde_json::to_string(&BuySetup::RangeBounce).unwrap(),
            "\"RANGE_BOUNCE\""
        );
    }

    #[test]
    fn flat_candle_has_zero_range() {
        let c = Candle {
            time: Utc::now(),
            open: 5.0,
            high: 5.0,
            low: 5.0,
            close: 5.0,
            volume: 0.0,
        };
        assert_eq!(c.range(), 0.0);
    }
}
