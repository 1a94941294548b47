use async_trait::async_trait;

use crate::{Candle, Result, Timeframe};

/// Source of historical candle batches.
///
/// `BinanceClient` implements this against the live REST API.
/// `ReplaySource` implements this over stored series for offline runs and tests.
///
/// The orchestrator receives the source explicitly; nothing else in the
/// workspace reaches for a process-wide client.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` candles for `symbol` on `timeframe`, oldest first.
    ///
    /// The newest candle may still be forming. Returning fewer candles than
    /// requested is not an error.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}
