use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::RateProvider;
use crate::errors::CoreError;
use crate::models::rate::is_valid_rate;

const BASE_URL: &str = "https://open.er-api.com";
const PROVIDER: &str = "open.er-api";

/// ExchangeRate-API open access endpoint.
///
/// - **Free**: No API key; rates refresh once a day.
/// - **Endpoint**: `/v6/latest/{BASE}` returns every rate against `BASE`.
/// - **Shape**: `{"result": "success", "base_code": "USD", "rates": {"CNY": 7.2, ...}}`
///
/// On errors the body carries `"result": "error"` and an `error-type`.
pub struct OpenErApiProvider {
    client: Client,
    base_url: String,
}

impl OpenErApiProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(BASE_URL, timeout)
    }

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

// ── open.er-api response types ──────────────────────────────────────

#[derive(Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rate(&self, base: &str, quote: &str) -> Result<f64, CoreError> {
        let base = base.to_uppercase();
        let target = quote.to_uppercase();

        if base == target {
            return Ok(1.0);
        }

        let url = format!("{}/v6/latest/{base}", self.base_url);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for {base}"),
            });
        }

        let body: LatestResponse = resp.json().await.map_err(|e| CoreError::Parse {
            provider: PROVIDER.into(),
            message: format!("Failed to parse latest rates for {base}: {e}"),
        })?;

        if body.result != "success" {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!(
                    "Request for {base} rejected: {}",
                    body.error_type.as_deref().unwrap_or("unknown error")
                ),
            });
        }

        let rate = body.rates.get(&target).copied().ok_or_else(|| CoreError::Parse {
            provider: PROVIDER.into(),
            message: format!("No {target} entry in rates for {base}"),
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
