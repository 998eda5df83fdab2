use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::RateProvider;
use crate::errors::CoreError;
use crate::models::rate::is_valid_rate;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";
const PROVIDER: &str = "Frankfurter";

/// Frankfurter API provider for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) reference rates, published once
///   per working day.
/// - **Endpoint**: `/latest?base=USD&symbols=CNY`
///
/// Second in the default priority order; used when open.er-api is down.
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(BASE_URL, timeout)
    }

    /// Point the provider at another host (mirrors, local test servers).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rate(&self, base: &str, quote: &str) -> Result<f64, CoreError> {
        let base = base.to_uppercase();
        let target = quote.to_uppercase();

        // Same currency → rate is 1.0
        if base == target {
            return Ok(1.0);
        }

        let url = format!("{}/latest", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("base", base.as_str()), ("symbols", target.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for {base}/{target}"),
            });
        }

        let body: RatesResponse = resp.json().await.map_err(|e| CoreError::Parse {
            provider: PROVIDER.into(),
            message: format!("Failed to parse response for {base}/{target}: {e}"),
        })?;

        let rate = body.rates.get(&target).copied().ok_or_else(|| CoreError::Parse {
            provider: PROVIDER.into(),
            message: format!("No rate found for {base} → {target}"),
        })?;

        if !is_valid_rate(rate) {
            return Err(CoreError::Parse {
                provider: PROVIDER.into(),
                message: format!("Invalid rate for {base} → {target}: {rate}"),
            });
        }
        Ok(rate)
    }
}
