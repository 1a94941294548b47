use common::{BuySetup, Candle, CandleBias, Regime, Result, SellTrigger};
use tracing::debug;

use crate::candle::classify;
use crate::indicators::Overlay;
use crate::series::{back, require_back, window_before_last_closed, LAST_CLOSED};

/// Candles (before the last closed one) scanned for support/resistance.
pub const LEVEL_LOOKBACK: usize = 6;

/// Trend pullback: price may sit this far under the 50 average.
const PULLBACK_TOLERANCE: f64 = 0.995;
/// Range bounce: price must be within this factor above support.
const SUPPORT_PROXIMITY: f64 = 1.01;
const TREND_MIN_RSI: f64 = 45.0;
const RANGE_MIN_RSI: f64 = 35.0;

/// BUY rules in priority order. The first matching rule wins.
pub const BUY_RULES: [BuySetup; 2] = [BuySetup::TrendPullback, BuySetup::RangeBounce];

/// Reward multiples applied to the entry-to-stop distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    pub rr_trend: f64,
    pub rr_range: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            rr_trend: 2.0,
            rr_range: 1.5,
        }
    }
}

impl SignalParams {
    fn reward_multiple(&self, setup: BuySetup) -> f64 {
        match setup {
            BuySetup::TrendPullback => self.rr_trend,
            BuySetup::RangeBounce => self.rr_range,
        }
    }
}

/// Support and resistance from the candles preceding the last closed one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub support: f64,
    pub resistance: f64,
}

/// Minimum low and maximum high over the [`LEVEL_LOOKBACK`] candles
/// immediately before the last closed candle.
///
/// Requires at least seven closed candles (eight including the provisional one).
pub fn support_resistance(candles: &[Candle]) -> Result<Levels> {
    let window = window_before_last_closed(candles, LEVEL_LOOKBACK, "support/resistance")?;
    let support = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    Ok(Levels {
        support,
        resistance,
    })
}

/// Everything the rules look at, taken from the last closed lower-timeframe candle.
///
/// Values that could not be computed are `None`; any rule that needs one
/// of them simply does not fire.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInputs {
    pub regime: Regime,
    pub bias: CandleBias,
    pub price: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub rsi: Option<f64>,
    pub hist_now: f64,
    pub hist_prev: Option<f64>,
    pub levels: Option<Levels>,
}

impl SignalInputs {
    /// Read the rule inputs off a lower-timeframe series and its overlay.
    ///
    /// Fails only when there is no closed candle at all.
    pub fn from_series(candles: &[Candle], overlay: &Overlay, regime: Regime) -> Result<Self> {
        let candle = require_back(candles, LAST_CLOSED, "last closed candle")?;

        let levels = match support_resistance(candles) {
            Ok(levels) => Some(levels),
            Err(e) => {
                debug!(error = %e, "Support/resistance undefined, BUY rules disabled");
                None
            }
        };

        Ok(Self {
            regime,
            bias: classify(&candle),
            price: candle.close,
            ema20: require_back(&overlay.ema20, LAST_CLOSED, "EMA20")?,
            ema50: require_back(&overlay.ema50, LAST_CLOSED, "EMA50")?,
            ema200: require_back(&overlay.ema200, LAST_CLOSED, "EMA200")?,
            rsi: back(&overlay.rsi, LAST_CLOSED).flatten(),
            hist_now: require_back(&overlay.macd.histogram, LAST_CLOSED, "MACD histogram")?,
            hist_prev: back(&overlay.macd.histogram, LAST_CLOSED + 1),
            levels,
        })
    }
}

/// A BUY advisory at full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuySignal {
    pub setup: BuySetup,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Signals {
    pub buy: Option<BuySignal>,
    pub sell: Option<SellTrigger>,
}

/// Run the BUY rule chain and the SELL rule. BUY and SELL are independent.
pub fn evaluate(inputs: &SignalInputs, params: &SignalParams) -> Signals {
    Signals {
        buy: evaluate_buy(inputs, params),
        sell: evaluate_sell(inputs),
    }
}

pub fn evaluate_buy(inputs: &SignalInputs, params: &SignalParams) -> Option<BuySignal> {
    let levels = inputs.levels?;
    let setup = BUY_RULES
        .into_iter()
        .find(|&setup| buy_rule_matches(setup, inputs, &levels))?;

    let entry = inputs.price;
    let stop = levels.support;
    let target = entry + (entry - stop) * params.reward_multiple(setup);
    Some(BuySignal {
        setup,
        entry,
        stop,
        target,
    })
}

fn buy_rule_matches(setup: BuySetup, i: &SignalInputs, levels: &Levels) -> bool {
    match setup {
        BuySetup::TrendPullback => {
            i.regime == Regime::Uptrend
                && i.bias == CandleBias::Bullish
                && i.ema20 > i.ema50
                && i.ema50 > i.ema200
                && i.price >= i.ema50 * PULLBACK_TOLERANCE
                && i.rsi.is_some_and(|rsi| rsi > TREND_MIN_RSI)
        }
        BuySetup::RangeBounce => {
            i.regime == Regime::Range
                && i.bias == CandleBias::Range
                && i.price <= levels.support * SUPPORT_PROXIMITY
                && i.hist_prev.is_some_and(|prev| i.hist_now > prev)
                && i.rsi.is_some_and(|rsi| rsi > RANGE_MIN_RSI)
        }
    }
}

pub fn evaluate_sell(inputs: &SignalInputs) -> Option<SellTrigger> {
    match inputs.regime {
        Regime::Uptrend if inputs.price < inputs.ema50 || inputs.bias == CandleBias::Bearish => {
            Some(SellTrigger::TrendBreakdown)
        }
        Regime::Range if inputs.hist_now < 0.0 => Some(SellTrigger::MomentumNegative),
        _ => None,
    }
}
