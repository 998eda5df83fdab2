use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::{CloseSeries, MarketDataSource};
use crate::errors::CoreError;

const SPARK_BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER: &str = "Yahoo Finance";
// Yahoo rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) pnl-monitor";

/// Yahoo Finance market data for stock/equity prices.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices, mutual funds.
///
/// Per-ticker lookups go through the `yahoo_finance_api` crate. The batch
/// call uses the spark endpoint directly, since it is the only one that
/// returns intraday bars for many symbols in a single request.
/// Prices are in the listing currency (USD for US tickers).
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
    client: Client,
    spark_base_url: String,
    timeout: Duration,
}

impl YahooFinanceProvider {
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Ok(Self {
            connector,
            client,
            spark_base_url: SPARK_BASE_URL.to_string(),
            timeout,
        })
    }

    /// Send batch requests to another host (local test servers).
    pub fn with_spark_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.spark_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

// ── Spark API response types ────────────────────────────────────────

#[derive(Deserialize)]
struct SparkEnvelope {
    spark: SparkBody,
}

// Entries stay raw so one malformed symbol can't fail the whole batch
#[derive(Deserialize)]
struct SparkBody {
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<SparkError>,
}

#[derive(Deserialize)]
struct SparkError {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct SparkResult {
    symbol: String,
    #[serde(default)]
    response: Option<Vec<SparkSeries>>,
}

#[derive(Deserialize)]
struct SparkSeries {
    #[serde(default)]
    indicators: Option<SparkIndicators>,
}

#[derive(Deserialize)]
struct SparkIndicators {
    #[serde(default)]
    quote: Option<Vec<SparkQuote>>,
}

#[derive(Deserialize)]
struct SparkQuote {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

impl SparkResult {
    fn into_closes(self) -> CloseSeries {
        self.response
            .unwrap_or_default()
            .into_iter()
            .filter_map(|series| series.indicators)
            .flat_map(|ind| ind.quote.unwrap_or_default())
            .flat_map(|q| q.close.unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn intraday_closes(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, CloseSeries>, CoreError> {
        if tickers.is_empty() {
            return Ok(HashMap::new());
        }

        let symbols = tickers.join(",");
        let url = format!("{}/v7/finance/spark", self.spark_base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbols", symbols.as_str()),
                ("range", "1d"),
                ("interval", "1m"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for spark request ({symbols})"),
            });
        }

        let envelope: SparkEnvelope = resp.json().await.map_err(|e| CoreError::Parse {
            provider: PROVIDER.into(),
            message: format!("Failed to parse spark response for {symbols}: {e}"),
        })?;

        if let Some(err) = envelope.spark.error {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: err
                    .description
                    .unwrap_or_else(|| "spark request failed".to_string()),
            });
        }

        let mut closes = HashMap::new();
        for entry in envelope.spark.result.unwrap_or_default() {
            match serde_json::from_value::<SparkResult>(entry) {
                Ok(result) => {
                    closes.insert(result.symbol.to_uppercase(), result.into_closes());
                }
                Err(e) => warn!("Skipping malformed spark entry in {symbols}: {e}"),
            }
        }
        Ok(closes)
    }

    async fn daily_close(&self, ticker: &str) -> Result<Option<f64>, CoreError> {
        let resp = tokio::time::timeout(
            self.timeout,
            self.connector.get_quote_range(ticker, "1d", "1d"),
        )
        .await?
        .map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to fetch daily bar for {ticker}: {e}"),
        })?;

        // An empty chart comes back as an error from `quotes()`
        Ok(resp
            .quotes()
            .ok()
            .and_then(|quotes| quotes.last().map(|q| q.close)))
    }

    async fn latest_price(&self, ticker: &str) -> Result<f64, CoreError> {
        let resp = tokio::time::timeout(
            self.timeout,
            self.connector.get_latest_quotes(ticker, "1m"),
        )
        .await?
        .map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to fetch latest quote for {ticker}: {e}"),
        })?;

        let quote = resp.last_quote().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No quote data for {ticker}: {e}"),
        })?;

        Ok(quote.close)
    }
}
