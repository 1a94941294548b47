use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use common::{
    BuyAdvisory, Candle, EvaluationResult, MarketDataSource, Result, ScanSnapshot, SellAdvisory,
};
use strategy::indicators::{close_prices, ema, EMA_LONG, EMA_MEDIUM};
use strategy::series::{require_back, LAST_CLOSED};
use strategy::{
    close_position, detect_regime, evaluate, Overlay, ScannerFileConfig, SignalInputs,
    SignalParams,
};

const QUOTE_ASSET: &str = "USDT";
const CHART_BASE_URL: &str = "https://www.binance.com/en/trade";

/// Drives one scan pass: fetch, evaluate and collect every configured instrument.
///
/// Instruments are evaluated one after another. A failure for one instrument
/// is logged and the instrument is left out of the pass; it never stops the others.
pub struct Orchestrator {
    source: Arc<dyn MarketDataSource>,
    cfg: ScannerFileConfig,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn MarketDataSource>, cfg: ScannerFileConfig) -> Self {
        Self { source, cfg }
    }

    pub fn config(&self) -> &ScannerFileConfig {
        &self.cfg
    }

    /// Fetch both timeframes for `symbol` and evaluate them.
    pub async fn evaluate_instrument(&self, symbol: &str) -> Result<EvaluationResult> {
        let ltf = self
            .source
            .fetch_candles(symbol, self.cfg.lower_timeframe, self.cfg.candle_limit)
            .await?;
        let htf = self
            .source
            .fetch_candles(symbol, self.cfg.higher_timeframe, self.cfg.candle_limit)
            .await?;

        evaluate_series(symbol, &ltf, &htf, &self.cfg.signal_params())
    }

    /// Evaluate every instrument in configured order and build a fresh snapshot.
    pub async fn run_pass(&self) -> ScanSnapshot {
        let mut results = Vec::with_capacity(self.cfg.instruments.len());
        let mut failed = Vec::new();

        for symbol in &self.cfg.instruments {
            match self.evaluate_instrument(symbol).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(%symbol, error = %e, "Evaluation failed, skipping instrument this pass");
                    failed.push(symbol.clone());
                }
            }
        }

        let buys = results.iter().filter(|r| r.buy.is_some()).count();
        let sells = results.iter().filter(|r| r.sell.is_some()).count();
        info!(
            evaluated = results.len(),
            failed = failed.len(),
            buys,
            sells,
            "Scan pass complete"
        );

        ScanSnapshot {
            generated_at: Utc::now(),
            results,
            failed,
        }
    }
}

/// Evaluate one instrument from already-fetched lower (`ltf`) and higher (`htf`)
/// timeframe series.
pub fn evaluate_series(
    symbol: &str,
    ltf: &[Candle],
    htf: &[Candle],
    params: &SignalParams,
) -> Result<EvaluationResult> {
    let htf_closes = close_prices(htf);
    let regime = detect_regime(
        &htf_closes,
        &ema(&htf_closes, EMA_MEDIUM),
        &ema(&htf_closes, EMA_LONG),
    )?;

    let overlay = Overlay::compute(ltf);
    let inputs = SignalInputs::from_series(ltf, &overlay, regime)?;
    let candle = require_back(ltf, LAST_CLOSED, "last closed candle")?;
    let signals = evaluate(&inputs, params);

    Ok(EvaluationResult {
        symbol: display_label(symbol),
        price: round_dp(candle.close, 4),
        regime,
        high: round_dp(candle.high, 4),
        low: round_dp(candle.low, 4),
        range: round_dp(candle.range(), 4),
        close_pct: close_position(&candle).map_or(0.0, |pos| round_dp(pos * 100.0, 1)),
        candle: inputs.bias,
        buy: signals.buy.map(|b| BuyAdvisory {
            setup: b.setup,
            reason: b.setup.reason().to_string(),
            entry: round_dp(b.entry, 4),
            target: round_dp(b.target, 4),
            stop: round_dp(b.stop, 4),
        }),
        sell: signals.sell.map(|trigger| SellAdvisory {
            trigger,
            reason: trigger.reason().to_string(),
        }),
        chart: chart_url(symbol),
    })
}

/// "BTCUSDT" → "BTC". Symbols not quoted in USDT keep their full name.
pub fn display_label(symbol: &str) -> String {
    match symbol.strip_suffix(QUOTE_ASSET) {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => symbol.to_string(),
    }
}

/// Spot trading page for the instrument.
pub fn chart_url(symbol: &str) -> String {
    match symbol.strip_suffix(QUOTE_ASSET) {
        Some(base) if !base.is_empty() => {
            format!("{CHART_BASE_URL}/{base}_{QUOTE_ASSET}?type=spot")
        }
        _ => format!("{CHART_BASE_URL}/{symbol}?type=spot"),
    }
}

fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use common::{CandleBias, Error, Regime, SellTrigger, Timeframe};
    use replay::ReplaySource;
    use strategy::config::DEFAULT_INSTRUMENTS;

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            time: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(15 * i),
            open: (high + low) / 2.0,
            high,
            low,
            close,
            volume: 5.0,
        }
    }

    /// Gently rising series, `n` candles.
    fn rising(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64 * 0.1;
                bar(i as i64, c + 0.5, c - 0.5, c)
            })
            .collect()
    }

    /// Delegates to a replay source but fails for one symbol.
    struct FailingFor {
        inner: ReplaySource,
        symbol: &'static str,
    }

    #[async_trait]
    impl MarketDataSource for FailingFor {
        async fn fetch_candles(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            limit: usize,
        ) -> Result<Vec<Candle>> {
            if symbol == self.symbol {
                return Err(Error::unavailable(symbol, timeframe, "connection reset"));
            }
            self.inner.fetch_candles(symbol, timeframe, limit).await
        }
    }

    fn replay_for(symbols: &[&str]) -> ReplaySource {
        let mut source = ReplaySource::new();
        for s in symbols {
            source.insert(s, Timeframe::M15, rising(300));
            source.insert(s, Timeframe::H1, rising(300));
        }
        source
    }

    #[test]
    fn labels_and_links() {
        assert_eq!(display_label("BTCUSDT"), "BTC");
        assert_eq!(display_label("USDTUSD"), "USDTUSD");
        assert_eq!(display_label("USDT"), "USDT");
        assert_eq!(
            chart_url("ETHUSDT"),
            "https://www.binance.com/en/trade/ETH_USDT?type=spot"
        );
        assert_eq!(
            chart_url("USDTUSD"),
            "https://www.binance.com/en/trade/USDTUSD?type=spot"
        );
    }

    #[test]
    fn rounding_is_presentation_only() {
        assert_eq!(round_dp(1.234_56, 4), 1.2346);
        assert_eq!(round_dp(49.96, 1), 50.0);
    }

    #[test]
    fn mid_range_close_reports_range_bias_and_fifty_percent() {
        let mut ltf = rising(50);
        ltf[48] = bar(48, 110.0, 100.0, 105.0);
        let htf = rising(50);

        let result = evaluate_series("BTCUSDT", &ltf, &htf, &SignalParams::default()).unwrap();
        assert_eq!(result.candle, CandleBias::Range);
        assert_eq!(result.close_pct, 50.0);
        assert_eq!(result.high, 110.0);
        assert_eq!(result.low, 100.0);
        assert_eq!(result.range, 10.0);
        assert_eq!(result.price, 105.0);
        assert_eq!(result.symbol, "BTC");
    }

    #[test]
    fn flat_candle_reports_neutral_and_zero_percent() {
        let mut ltf = rising(50);
        ltf[48] = bar(48, 104.0, 104.0, 104.0);
        let result = evaluate_series("BTCUSDT", &ltf, &rising(50), &SignalParams::default()).unwrap();
        assert_eq!(result.candle, CandleBias::Neutral);
        assert_eq!(result.close_pct, 0.0);
        assert_eq!(result.range, 0.0);
    }

    #[test]
    fn rising_higher_timeframe_is_uptrend() {
        let result =
            evaluate_series("ETHUSDT", &rising(300), &rising(300), &SignalParams::default()).unwrap();
        assert_eq!(result.regime, Regime::Uptrend);
    }

    #[test]
    fn uptrend_close_below_ema50_sells() {
        let mut ltf = rising(300);
        // Last closed candle collapses well under the 50 average.
        ltf[298] = bar(298, 100.0, 90.0, 95.0);
        let result = evaluate_series("ETHUSDT", &ltf, &rising(300), &SignalParams::default()).unwrap();
        assert_eq!(result.regime, Regime::Uptrend);
        let sell = result.sell.unwrap();
        assert_eq!(sell.trigger, SellTrigger::TrendBreakdown);
        assert_eq!(sell.reason, "EMA50 loss or bearish close");
    }

    #[test]
    fn short_higher_timeframe_fails_evaluation() {
        let err = evaluate_series("BTCUSDT", &rising(50), &rising(4), &SignalParams::default());
        assert!(matches!(err, Err(Error::InsufficientHistory { .. })));
    }

    #[test]
    fn short_lower_timeframe_yields_result_without_buy() {
        let result = evaluate_series("BTCUSDT", &rising(5), &rising(50), &SignalParams::default()).unwrap();
        assert!(result.buy.is_none());
    }

    #[tokio::test]
    async fn one_failing_instrument_is_omitted() {
        let inner = replay_for(&DEFAULT_INSTRUMENTS);
        let source = Arc::new(FailingFor {
            inner,
            symbol: "SOLUSDT",
        });
        let orchestrator = Orchestrator::new(source, ScannerFileConfig::default());

        let snapshot = orchestrator.run_pass().await;
        assert_eq!(snapshot.results.len(), 25);
        assert_eq!(snapshot.failed, vec!["SOLUSDT".to_string()]);
        assert!(snapshot.results.iter().all(|r| r.symbol != "SOL"));
    }

    #[tokio::test]
    async fn results_keep_configured_order() {
        let cfg = ScannerFileConfig {
            instruments: vec!["ETHUSDT".into(), "BTCUSDT".into()],
            ..ScannerFileConfig::default()
        };
        let orchestrator = Orchestrator::new(Arc::new(replay_for(&["BTCUSDT", "ETHUSDT"])), cfg);
        let snapshot = orchestrator.run_pass().await;
        let labels: Vec<&str> = snapshot.results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(labels, vec!["ETH", "BTC"]);
    }

    #[tokio::test]
    async fn missing_series_is_data_unavailable() {
        let orchestrator = Orchestrator::new(
            Arc::new(ReplaySource::new()),
            ScannerFileConfig::default(),
        );
        let err = orchestrator.evaluate_instrument("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { .. }));
    }
}
