use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use common::{Candle, Error, MarketDataSource, Result, Timeframe};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest `limit` the klines endpoint accepts.
const MAX_KLINE_LIMIT: usize = 1000;

/// Minimum spacing between consecutive requests from one client.
const MIN_REQUEST_GAP: Duration = Duration::from_millis(100);

/// Public REST client for Binance spot klines. No credentials needed.
pub struct BinanceClient {
    base_url: String,
    http: Client,
    last_request: Mutex<Option<Instant>>,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            last_request: Mutex::new(None),
        })
    }

    fn klines_url(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Url> {
        let limit = limit.clamp(1, MAX_KLINE_LIMIT).to_string();
        Url::parse_with_params(
            &format!("{}/api/v3/klines", self.base_url),
            &[
                ("symbol", symbol),
                ("interval", timeframe.as_str()),
                ("limit", limit.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid Binance base URL '{}': {e}", self.base_url)))
    }

    /// Hold the request until `MIN_REQUEST_GAP` has passed since the previous one.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + MIN_REQUEST_GAP;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = self.klines_url(symbol, timeframe, limit)?;
        self.throttle().await;

        debug!(%symbol, %timeframe, limit, "Fetching klines from Binance");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::unavailable(symbol, timeframe, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::unavailable(symbol, timeframe, e))?;

        if !status.is_success() {
            return Err(Error::unavailable(
                symbol,
                timeframe,
                format!("HTTP {status}: {body}"),
            ));
        }

        parse_klines(&body).map_err(|e| Error::unavailable(symbol, timeframe, e))
    }
}

// ─── Kline JSON parsing ───────────────────────────────────────────────────────

/// Parse a klines response: an array of rows
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`.
fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            parse_row(row).ok_or_else(|| Error::Exchange(format!("malformed kline row {i}")))
        })
        .collect()
}

fn parse_row(row: &[Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    let time: DateTime<Utc> = Utc.timestamp_millis_opt(row[0].as_i64()?).single()?;
    Some(Candle {
        time,
        open: decimal_field(&row[1])?,
        high: decimal_field(&row[2])?,
        low: decimal_field(&row[3])?,
        close: decimal_field(&row[4])?,
        volume: decimal_field(&row[5])?,
    })
}

/// Binance encodes prices as decimal strings; accept bare numbers too.
fn decimal_field(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok()?,
        other => other.as_f64()?,
    };
    parsed.is_finite().then_some(parsed)
}
