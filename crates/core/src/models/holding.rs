use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// One configured position: how many shares of a ticker are held and what
/// was paid per share, in the source currency.
///
/// Tickers are stored trimmed and uppercased so lookups against quote
/// results are case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    /// Ticker symbol, uppercased (e.g., "RZLT", "AAPL")
    pub ticker: String,

    /// Number of shares held (fractional shares allowed)
    #[serde(alias = "qty")]
    pub quantity: f64,

    /// Average cost per share in the source currency
    #[serde(alias = "cost")]
    pub cost_per_share: f64,
}

impl PortfolioEntry {
    /// Build a validated entry.
    pub fn new(
        ticker: impl Into<String>,
        quantity: f64,
        cost_per_share: f64,
    ) -> Result<Self, CoreError> {
        let entry = Self {
            ticker: normalize_ticker(&ticker.into()),
            quantity,
            cost_per_share,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Check the invariants: non-empty ticker, finite non-negative numbers.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ticker.is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Quantity for {} must be a finite non-negative number, got {}",
                self.ticker, self.quantity
            )));
        }
        if !self.cost_per_share.is_finite() || self.cost_per_share < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Cost per share for {} must be a finite non-negative number, got {}",
                self.ticker, self.cost_per_share
            )));
        }
        Ok(())
    }

    /// Total amount paid for the position, in the source currency.
    #[must_use]
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.cost_per_share
    }
}

/// Trim and uppercase a ticker symbol.
#[must_use]
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Validate a whole holdings list: every entry valid, tickers unique.
pub fn validate_holdings(entries: &[PortfolioEntry]) -> Result<(), CoreError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        entry.validate()?;
        if !seen.insert(entry.ticker.as_str()) {
            return Err(CoreError::ValidationError(format!(
                "Duplicate ticker in portfolio: {}",
                entry.ticker
            )));
        }
    }
    Ok(())
}

/// The starter portfolio used when no settings file is present.
#[must_use]
pub fn default_holdings() -> Vec<PortfolioEntry> {
    vec![
        PortfolioEntry {
            ticker: "RZLT".into(),
            quantity: 200.0,
            cost_per_share: 1.26,
        },
        PortfolioEntry {
            ticker: "RKLX".into(),
            quantity: 20.33,
            cost_per_share: 45.64,
        },
        PortfolioEntry {
            ticker: "CRWG".into(),
            quantity: 140.0,
            cost_per_share: 3.81,
        },
    ]
}
