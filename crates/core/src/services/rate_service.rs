use log::{debug, warn};
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::cache::{RateKey, TtlCache};
use crate::models::rate::{is_valid_rate, ExchangeRate};
use crate::providers::traits::RateProvider;

/// Resolves the exchange rate used to convert every figure of a pass.
///
/// Strategy:
/// - **Cache hit**: return the memoized rate, no network call.
/// - **Cache miss**: ask each provider in priority order; first valid answer wins
///   and is cached for the cache's window.
/// - **All providers failed**: substitute the configured fallback constant and
///   cache it for the (shorter) fallback window, so sources are retried soon.
pub struct RateService {
    fallback_rate: f64,
    fallback_ttl: Duration,
}

impl RateService {
    pub fn new(fallback_rate: f64, fallback_ttl: Duration) -> Self {
        Self {
            fallback_rate,
            fallback_ttl,
        }
    }

    /// Cached rate lookup that never fails.
    pub async fn get_exchange_rate(
        &self,
        cache: &mut TtlCache<RateKey, ExchangeRate>,
        providers: &[&dyn RateProvider],
        base: &str,
        quote: &str,
    ) -> ExchangeRate {
        let key = (base.to_uppercase(), quote.to_uppercase());

        if let Some(rate) = cache.get(&key) {
            debug!("Exchange rate {}/{} served from cache", key.0, key.1);
            return rate.clone();
        }

        match self.fetch_rate(providers, base, quote).await {
            Ok(rate) => {
                cache.insert(key, rate.clone());
                rate
            }
            Err(e) => {
                warn!(
                    "No exchange-rate source answered for {}/{} ({e}); using fallback {}",
                    key.0, key.1, self.fallback_rate
                );
                let rate = ExchangeRate::fallback(base, quote, self.fallback_rate);
                cache.insert_for(key, rate.clone(), self.fallback_ttl);
                rate
            }
        }
    }

    /// Uncached lookup returning the typed failure of the last provider tried.
    pub async fn fetch_rate(
        &self,
        providers: &[&dyn RateProvider],
        base: &str,
        quote: &str,
    ) -> Result<ExchangeRate, CoreError> {
        if providers.is_empty() {
            return Err(CoreError::NoProvider(format!(
                "exchange rate {}/{}",
                base.to_uppercase(),
                quote.to_uppercase()
            )));
        }

        let mut last_error = None;
        for provider in providers {
            match provider.get_rate(base, quote).await {
                Ok(rate) if is_valid_rate(rate) => {
                    debug!("{} answered {base}/{quote} = {rate}", provider.name());
                    return Ok(ExchangeRate::live(base, quote, rate, provider.name()));
                }
                Ok(rate) => {
                    warn!("{} returned an unusable rate {rate}", provider.name());
                    last_error = Some(CoreError::Parse {
                        provider: provider.name().to_string(),
                        message: format!("Invalid rate {rate} (must be finite and positive)"),
                    });
                }
                Err(e) if e.is_unreachable() => {
                    warn!("Exchange-rate source {} unreachable: {e}", provider.name());
                    last_error = Some(e);
                }
                Err(e) => {
                    warn!("Exchange-rate source {} answered unusably: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("exchange rate".into())))
    }
}
