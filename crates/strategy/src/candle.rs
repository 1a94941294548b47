use common::{Candle, CandleBias};

/// Close position at or above this fraction of the range is bullish.
pub const BULLISH_POSITION: f64 = 0.65;
/// Close position at or below this fraction of the range is bearish.
pub const BEARISH_POSITION: f64 = 0.35;

/// Where the close sits within the candle's range, in `[0, 1]`.
/// `None` for a flat candle.
pub fn close_position(candle: &Candle) -> Option<f64> {
    let range = candle.range();
    if range == 0.0 {
        return None;
    }
    Some((candle.close - candle.low) / range)
}

/// Classify a candle by where it closed within its range.
pub fn classify(candle: &Candle) -> CandleBias {
    match close_position(candle) {
        None => CandleBias::Neutral,
        Some(pos) if pos >= BULLISH_POSITION => CandleBias::Bullish,
        Some(pos) if pos <= BEARISH_POSITION => CandleBias::Bearish,
        Some(_) => CandleBias::Range,
    }
}
