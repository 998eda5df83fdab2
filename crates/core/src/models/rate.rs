use serde::{Deserialize, Serialize};

/// Where an exchange rate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSource {
    /// Answered by an upstream provider
    Live { provider: String },
    /// Every provider failed; the configured constant was substituted
    Fallback,
}

/// Units of `quote` currency per one unit of `base` (e.g., CNY per USD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: String,
    pub quote: String,
    pub rate: f64,
    pub source: RateSource,
}

impl ExchangeRate {
    pub fn live(base: &str, quote: &str, rate: f64, provider: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
            rate,
            source: RateSource::Live {
                provider: provider.to_string(),
            },
        }
    }

    pub fn fallback(base: &str, quote: &str, rate: f64) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
            rate,
            source: RateSource::Fallback,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }

    /// Convert an amount in the base currency into the quote currency.
    #[must_use]
    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

/// A rate is usable when it is finite and strictly positive.
#[must_use]
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
