use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest known price for one ticker. `None` means the price could not be
/// determined this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub ticker: String,
    pub last_price: Option<f64>,
}

/// Result of one price fetch: every requested ticker mapped to its latest
/// price, or `None` when that ticker could not be resolved.
///
/// An empty `Quotes` is what a failed fetch degrades to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quotes {
    prices: BTreeMap<String, Option<f64>>,
}

impl Quotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved price for `ticker` (uppercased).
    pub fn insert(&mut self, ticker: &str, price: f64) {
        self.prices.insert(ticker.to_uppercase(), Some(price));
    }

    /// Record that `ticker` was requested but could not be resolved.
    pub fn mark_missing(&mut self, ticker: &str) {
        self.prices.insert(ticker.to_uppercase(), None);
    }

    /// The resolved price for a ticker, if any.
    #[must_use]
    pub fn price(&self, ticker: &str) -> Option<f64> {
        self.prices
            .get(&ticker.to_uppercase())
            .copied()
            .flatten()
    }

    /// True when at least one ticker resolved to a price.
    #[must_use]
    pub fn has_prices(&self) -> bool {
        self.prices.values().any(Option::is_some)
    }

    /// Number of tickers with a resolved price.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.prices.values().filter(|p| p.is_some()).count()
    }

    /// Tickers that were requested but are absent, sorted.
    #[must_use]
    pub fn missing(&self) -> Vec<String> {
        self.prices
            .iter()
            .filter(|(_, p)| p.is_none())
            .map(|(t, _)| t.clone())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

}

impl FromIterator<PriceQuote> for Quotes {
    fn from_iter<I: IntoIterator<Item = PriceQuote>>(iter: I) -> Self {
        let mut quotes = Quotes::new();
        for q in iter {
            match q.last_price {
                Some(p) => quotes.insert(&q.ticker, p),
                None => quotes.mark_missing(&q.ticker),
            }
        }
        quotes
    }
}

/// Check that an upstream price is usable: finite and non-negative.
#[must_use]
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}
