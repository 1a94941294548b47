use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use common::{Candle, Error, MarketDataSource, Result, Timeframe};

/// Offline market-data source backed by stored candle series.
///
/// Series are keyed by (symbol, timeframe). Fetches return the newest
/// `limit` candles of the stored series. Nothing is ever sent to an exchange.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    series: HashMap<(String, Timeframe), Vec<Candle>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a series, replacing any previous one for the same key.
    /// Candles are kept oldest first.
    pub fn insert(&mut self, symbol: &str, timeframe: Timeframe, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.time);
        self.series.insert((symbol.to_string(), timeframe), candles);
    }

    /// Load every `<SYMBOL>_<timeframe>.json` file in `dir`.
    ///
    /// Each file holds a JSON array of candles. Files whose names do not
    /// follow the pattern are skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut source = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some((symbol, timeframe)) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(parse_file_stem)
            else {
                warn!(path = %path.display(), "Skipping replay file with unexpected name");
                continue;
            };

            let content = std::fs::read_to_string(&path)?;
            let candles: Vec<Candle> = serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("invalid replay file '{}': {e}", path.display()))
            })?;
            debug!(%symbol, %timeframe, candles = candles.len(), "Loaded replay series");
            source.insert(&symbol, timeframe, candles);
        }

        info!(dir = %dir.display(), series = source.len(), "Replay source ready");
        Ok(source)
    }

    /// Number of stored series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn parse_file_stem(stem: &str) -> Option<(String, Timeframe)> {
    let (symbol, token) = stem.rsplit_once('_')?;
    if symbol.is_empty() {
        return None;
    }
    Some((symbol.to_string(), token.parse().ok()?))
}

#[async_trait]
impl MarketDataSource for ReplaySource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let series = self
            .series
            .get(&(symbol.to_string(), timeframe))
            .ok_or_else(|| Error::unavailable(symbol, timeframe, "no replay series stored"))?;

        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 10.0 + i as f64;
                Candle {
                    time: Utc.timestamp_opt(1_700_000_000, 0).unwrap()
                        + Duration::hours(i as i64),
                    open: c,
                    high: c + 1.0,
                    low: c - 1.0,
                    close: c,
                    volume: 2.0,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn fetch_returns_newest_candles() {
        let mut source = ReplaySource::new();
        source.insert("BTCUSDT", Timeframe::H1, series(10));

        let candles = source.fetch_candles("BTCUSDT", Timeframe::H1, 3).await.unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close, 17.0);
        assert_eq!(candles[2].close, 19.0);
    }

    #[tokio::test]
    async fn fetch_returns_fewer_when_short() {
        let mut source = ReplaySource::new();
        source.insert("BTCUSDT", Timeframe::H1, series(4));
        let candles = source.fetch_candles("BTCUSDT", Timeframe::H1, 300).await.unwrap();
        assert_eq!(candles.len(), 4);
    }

    #[tokio::test]
    async fn unknown_series_is_unavailable() {
        let mut source = ReplaySource::new();
        source.insert("BTCUSDT", Timeframe::H1, series(4));
        let err = source
            .fetch_candles("BTCUSDT", Timeframe::M15, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn insert_orders_oldest_first() {
        let mut shuffled = series(5);
        shuffled.reverse();
        let mut source = ReplaySource::new();
        source.insert("ETHUSDT", Timeframe::M15, shuffled);
        let candles = source.fetch_candles("ETHUSDT", Timeframe::M15, 5).await.unwrap();
        assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn file_stem_parsing() {
        assert_eq!(
            parse_file_stem("BTCUSDT_15m"),
            Some(("BTCUSDT".to_string(), Timeframe::M15))
        );
        assert_eq!(parse_file_stem("BTCUSDT"), None);
        assert_eq!(parse_file_stem("BTCUSDT_7m"), None);
        assert_eq!(parse_file_stem("_1h"), None);
    }

    #[tokio::test]
    async fn load_dir_reads_series_files() {
        let dir = std::env::temp_dir().join(format!("replay-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("SOLUSDT_1h.json"),
            serde_json::to_string(&series(6)).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.join("badname.json"), "[]").unwrap();

        let source = ReplaySource::load_dir(&dir).unwrap();
        assert_eq!(source.len(), 1);
        let candles = source.fetch_candles("SOLUSDT", Timeframe::H1, 300).await.unwrap();
        assert_eq!(candles.len(), 6);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
