pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::ema;
pub use macd::{MacdIndicator, MacdSeries};
pub use rsi::RsiIndicator;

use common::Candle;

/// Moving-average spans computed for both timeframes.
pub const EMA_SHORT: usize = 20;
pub const EMA_MEDIUM: usize = 50;
pub const EMA_LONG: usize = 200;

/// Indicator series derived from one candle series, aligned index-for-index.
///
/// Every value at index `i` depends only on candles `..= i`.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub ema20: Vec<f64>,
    pub ema50: Vec<f64>,
    pub ema200: Vec<f64>,
    pub rsi: Vec<Option<f64>>,
    pub macd: MacdSeries,
}

impl Overlay {
    pub fn compute(candles: &[Candle]) -> Self {
        let closes = close_prices(candles);
        Self {
            ema20: ema(&closes, EMA_SHORT),
            ema50: ema(&closes, EMA_MEDIUM),
            ema200: ema(&closes, EMA_LONG),
            rsi: RsiIndicator::default().compute(&closes),
            macd: MacdIndicator::default().compute(&closes),
        }
    }
}

pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
