pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::Utc;
use log::info;
use models::{
    cache::ProviderCache,
    holding::PortfolioEntry,
    settings::{PriceStrategy, Settings},
    snapshot::{RenderState, Snapshot},
};
use providers::registry::ProviderRegistry;
use services::{
    price_service::PriceService, rate_service::RateService,
    valuation_service::ValuationService,
};

use errors::CoreError;

/// Main entry point for the pnl-monitor core library.
///
/// Owns the holdings, the upstream providers, and the two provider caches.
/// Each call to `render_pass` runs the whole pipeline once:
/// exchange rate → prices → valuation.
#[must_use]
pub struct PnlMonitor {
    settings: Settings,
    registry: ProviderRegistry,
    rate_service: RateService,
    price_service: PriceService,
    valuation_service: ValuationService,
    cache: ProviderCache,
}

impl std::fmt::Debug for PnlMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (rates, quotes) = self.cache.stats();
        f.debug_struct("PnlMonitor")
            .field("holdings", &self.settings.holdings.len())
            .field("strategy", &self.price_service.strategy())
            .field("rate_providers", &self.registry.rate_provider_names())
            .field("cached_rates", &rates)
            .field("cached_quotes", &quotes)
            .finish()
    }
}

impl PnlMonitor {
    /// Build a monitor with the upstreams named in `settings`.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let registry = ProviderRegistry::new_with_defaults(&settings);
        Self::with_registry(settings, registry)
    }

    /// Build a monitor around an explicit registry (tests, custom upstreams).
    pub fn with_registry(
        mut settings: Settings,
        registry: ProviderRegistry,
    ) -> Result<Self, CoreError> {
        settings.normalize();
        settings.validate()?;

        let rate_service = RateService::new(
            settings.rates.fallback_rate,
            settings.rates.fallback_ttl(),
        );
        let price_service = PriceService::new(settings.prices.strategy);
        let cache = ProviderCache::new(settings.rates.ttl(), settings.prices.ttl());

        Ok(Self {
            settings,
            registry,
            rate_service,
            price_service,
            valuation_service: ValuationService::new(),
            cache,
        })
    }

    // ── Pipeline ────────────────────────────────────────────────────

    /// Fetch (or reuse cached) rate and prices, then value the portfolio.
    ///
    /// Never fails: unreachable upstreams degrade to the fallback rate and to
    /// absent quotes. Returns `Waiting` when holdings exist but no price
    /// resolved at all.
    pub async fn render_pass(&mut self) -> RenderState {
        let providers = self.registry.rate_providers();
        let rate = self
            .rate_service
            .get_exchange_rate(
                &mut self.cache.rates,
                &providers,
                &self.settings.base_currency,
                &self.settings.target_currency,
            )
            .await;

        let tickers: Vec<String> = self
            .settings
            .holdings
            .iter()
            .map(|e| e.ticker.clone())
            .collect();
        let quotes = self
            .price_service
            .get_prices(&mut self.cache.quotes, self.registry.market_data(), &tickers)
            .await;

        let valuation = self
            .valuation_service
            .compute(&self.settings.holdings, &quotes, &rate);
        let as_of = Utc::now();

        if !self.settings.holdings.is_empty() && valuation.is_empty() {
            info!("No prices available yet; waiting for market data");
            return RenderState::Waiting {
                rate,
                as_of,
                missing: valuation.missing,
            };
        }

        info!(
            "Valued {} positions ({} skipped) at {} {}/{}",
            valuation.positions.len(),
            valuation.missing.len(),
            rate.rate,
            rate.base,
            rate.quote
        );
        RenderState::Ready(Snapshot {
            rate,
            valuation,
            as_of,
        })
    }

    /// Drop both caches and run a fresh pass.
    pub async fn force_refresh(&mut self) -> RenderState {
        self.invalidate_caches();
        self.render_pass().await
    }

    /// Drop both caches; the next pass hits the upstreams.
    pub fn invalidate_caches(&mut self) {
        info!("Clearing rate and quote caches");
        self.cache.invalidate();
    }

    // ── Holdings ────────────────────────────────────────────────────

    #[must_use]
    pub fn holdings(&self) -> &[PortfolioEntry] {
        &self.settings.holdings
    }

    /// Change quantity and cost of an existing holding.
    /// Caches are kept: new figures apply to the next pass without refetching.
    pub fn set_holding(
        &mut self,
        ticker: &str,
        quantity: f64,
        cost_per_share: f64,
    ) -> Result<(), CoreError> {
        let updated = PortfolioEntry::new(ticker, quantity, cost_per_share)?;
        let entry = self
            .settings
            .holdings
            .iter_mut()
            .find(|e| e.ticker == updated.ticker)
            .ok_or_else(|| {
                CoreError::ValidationError(format!("Unknown ticker: {}", updated.ticker))
            })?;
        *entry = updated;
        Ok(())
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Switch the price strategy. Cached quotes from the previous strategy
    /// are dropped.
    pub fn set_strategy(&mut self, strategy: PriceStrategy) {
        if self.price_service.strategy() != strategy {
            self.price_service.set_strategy(strategy);
            self.settings.prices.strategy = strategy;
            self.cache.quotes.invalidate();
        }
    }

    // ── Cache Inspection ────────────────────────────────────────────

    /// (cached rate entries, cached quote sets), expired ones included.
    #[must_use]
    pub fn cache_stats(&self) -> (usize, usize) {
        self.cache.stats()
    }
}
