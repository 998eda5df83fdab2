use log::warn;

use super::frankfurter::FrankfurterProvider;
use super::open_er_api::OpenErApiProvider;
use super::traits::{MarketDataSource, RateProvider};
use super::yahoo_finance::YahooFinanceProvider;
use crate::models::settings::{RateSourceKind, Settings};

/// Registry of the configured upstreams.
///
/// Rate providers are kept in priority order: the rate service asks them
/// one after another until one answers. There is one market-data source.
pub struct ProviderRegistry {
    rate_providers: Vec<Box<dyn RateProvider>>,
    market_data: Option<Box<dyn MarketDataSource>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            rate_providers: Vec::new(),
            market_data: None,
        }
    }

    /// Create a registry with the providers named in `settings`.
    pub fn new_with_defaults(settings: &Settings) -> Self {
        let mut registry = Self::new();
        let rate_timeout = settings.rates.timeout();

        for kind in &settings.rates.sources {
            match kind {
                RateSourceKind::OpenErApi => {
                    let provider = OpenErApiProvider::new(rate_timeout);
                    registry.register_rate_provider(Box::new(provider));
                }
                RateSourceKind::Frankfurter => {
                    let provider = FrankfurterProvider::new(rate_timeout);
                    registry.register_rate_provider(Box::new(provider));
                }
            }
        }

        match YahooFinanceProvider::new(settings.prices.timeout()) {
            Ok(yahoo) => registry.set_market_data(Box::new(yahoo)),
            Err(e) => warn!("Market data unavailable: {e}"),
        }

        registry
    }

    /// Append a rate provider at the lowest priority.
    pub fn register_rate_provider(&mut self, provider: Box<dyn RateProvider>) {
        self.rate_providers.push(provider);
    }

    /// Replace the market-data source.
    pub fn set_market_data(&mut self, source: Box<dyn MarketDataSource>) {
        self.market_data = Some(source);
    }

    /// Rate providers in priority order.
    pub fn rate_providers(&self) -> Vec<&dyn RateProvider> {
        self.rate_providers.iter().map(|p| p.as_ref()).collect()
    }

    pub fn market_data(&self) -> Option<&dyn MarketDataSource> {
        self.market_data.as_deref()
    }

    pub fn rate_provider_names(&self) -> Vec<String> {
        self.rate_providers
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
