use common::{Regime, Result};

use crate::series::{require_back, LAST_CLOSED};

/// How far back the 50 average is compared to confirm it is rising.
const SLOPE_LOOKBACK: usize = 3;

/// Classify the higher timeframe as trending or ranging.
///
/// Reads the last closed candle: UPTREND requires the close above the 200
/// average AND the 50 average above its own value three candles earlier.
/// Needs at least five candles (provisional one included).
pub fn detect_regime(closes: &[f64], ema50: &[f64], ema200: &[f64]) -> Result<Regime> {
    let close = require_back(closes, LAST_CLOSED, "regime close")?;
    let long = require_back(ema200, LAST_CLOSED, "regime EMA200")?;
    let medium_now = require_back(ema50, LAST_CLOSED, "regime EMA50")?;
    let medium_then = require_back(ema50, LAST_CLOSED + SLOPE_LOOKBACK, "regime EMA50 slope")?;

    if close > long && medium_now > medium_then {
        Ok(Regime::Uptrend)
    } else {
        Ok(Regime::Range)
    }
}
