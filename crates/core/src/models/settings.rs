use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::holding::{default_holdings, normalize_ticker, validate_holdings, PortfolioEntry};
use crate::errors::CoreError;

/// Files probed, in order, when no explicit settings path is given.
pub const DEFAULT_SETTINGS_PATHS: [&str; 2] = ["pnl-monitor.json", "config/pnl-monitor.json"];

/// Exchange-rate endpoints that can be listed in `rates.sources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSourceKind {
    /// open.er-api.com, no key required
    OpenErApi,
    /// api.frankfurter.dev (ECB data), no key required
    Frankfurter,
}

/// How prices are fetched from the market-data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStrategy {
    /// One intraday request for every ticker at once
    #[default]
    Batch,
    /// One daily-bar request per ticker, latest-quote request as fallback
    PerTicker,
}

impl std::fmt::Display for PriceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceStrategy::Batch => write!(f, "batch"),
            PriceStrategy::PerTicker => write!(f, "per-ticker"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSettings {
    /// Endpoints tried in priority order
    #[serde(default = "default_rate_sources")]
    pub sources: Vec<RateSourceKind>,

    /// Substituted when every source fails
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,

    /// How long a live rate stays cached
    #[serde(default = "default_rate_ttl")]
    pub ttl_secs: u64,

    /// How long a fallback rate stays cached before sources are retried
    #[serde(default = "default_fallback_ttl")]
    pub fallback_ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSettings {
    #[serde(default)]
    pub strategy: PriceStrategy,

    /// How long quotes for one ticker set stay cached
    #[serde(default = "default_price_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// User-facing configuration, read from a JSON file.
/// Every field has a default, so `{}` is a valid settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Currency the market quotes in (e.g., "USD").
    #[serde(default = "default_base_currency")]
    pub base_currency: String,

    /// Currency values are converted into for display (e.g., "CNY").
    #[serde(default = "default_target_currency")]
    pub target_currency: String,

    #[serde(default = "default_holdings")]
    pub holdings: Vec<PortfolioEntry>,

    #[serde(default)]
    pub rates: RateSettings,

    #[serde(default)]
    pub prices: PriceSettings,

    /// Seconds between automatic render passes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_target_currency() -> String {
    "CNY".to_string()
}

fn default_rate_sources() -> Vec<RateSourceKind> {
    vec![RateSourceKind::OpenErApi, RateSourceKind::Frankfurter]
}

fn default_fallback_rate() -> f64 {
    7.15
}

fn default_rate_ttl() -> u64 {
    3600
}

fn default_fallback_ttl() -> u64 {
    60
}

fn default_price_ttl() -> u64 {
    60
}

fn default_timeout() -> u64 {
    5
}

fn default_refresh_interval() -> u64 {
    60
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            sources: default_rate_sources(),
            fallback_rate: default_fallback_rate(),
            ttl_secs: default_rate_ttl(),
            fallback_ttl_secs: default_fallback_ttl(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            strategy: PriceStrategy::default(),
            ttl_secs: default_price_ttl(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            target_currency: default_target_currency(),
            holdings: default_holdings(),
            rates: RateSettings::default(),
            prices: PriceSettings::default(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl RateSettings {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    #[must_use]
    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PriceSettings {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Parse settings from a JSON string, then normalize and validate.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load settings from `path` if given (errors are returned), otherwise
    /// from the first default location that exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = path {
            let settings = Self::from_file(path)?;
            info!("Loaded settings from {}", path.display());
            return Ok(settings);
        }

        for candidate in DEFAULT_SETTINGS_PATHS {
            if Path::new(candidate).exists() {
                match Self::from_file(candidate) {
                    Ok(settings) => {
                        info!("Loaded settings from {candidate}");
                        return Ok(settings);
                    }
                    Err(e) => warn!("Failed to load settings file {candidate}: {e}"),
                }
            }
        }

        info!("No settings file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Uppercase currency codes and tickers.
    pub fn normalize(&mut self) {
        self.base_currency = self.base_currency.trim().to_uppercase();
        self.target_currency = self.target_currency.trim().to_uppercase();
        for entry in &mut self.holdings {
            entry.ticker = normalize_ticker(&entry.ticker);
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for code in [&self.base_currency, &self.target_currency] {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::Config(format!(
                    "Invalid currency code '{code}': must be exactly 3 ASCII letters (e.g., USD, CNY)"
                )));
            }
        }
        if !(self.rates.fallback_rate.is_finite() && self.rates.fallback_rate > 0.0) {
            return Err(CoreError::Config(format!(
                "Fallback rate must be a positive number, got {}",
                self.rates.fallback_rate
            )));
        }
        if self.rates.sources.is_empty() {
            warn!("No exchange-rate sources configured; the fallback rate will always be used");
        }
        if self.rates.timeout_secs == 0 || self.prices.timeout_secs == 0 {
            return Err(CoreError::Config("Request timeouts must be at least 1 second".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::Config("Refresh interval must be at least 1 second".into()));
        }
        validate_holdings(&self.holdings)
    }
}
