use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;

/// Close prices of a series, oldest first. `None` marks a bar with no trade.
pub type CloseSeries = Vec<Option<f64>>;

/// Source of exchange rates.
///
/// Each endpoint (open.er-api, Frankfurter) implements this trait; the rate
/// service walks them in priority order and decides what to do on failure.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Units of `quote` per one unit of `base`.
    async fn get_rate(&self, base: &str, quote: &str) -> Result<f64, CoreError>;
}

/// Source of equity prices.
///
/// Exposes the three calls the two price strategies are built from.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;

    /// One request for the current session's 1-minute bars of every ticker.
    /// Tickers the upstream does not know are simply absent from the map.
    async fn intraday_closes(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, CloseSeries>, CoreError>;

    /// Close of the most recent daily bar, `None` if the series is empty.
    async fn daily_close(&self, ticker: &str) -> Result<Option<f64>, CoreError>;

    /// Lightweight latest-quote lookup.
    async fn latest_price(&self, ticker: &str) -> Result<f64, CoreError>;
}
