use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::cache::{TickerSet, TtlCache};
use crate::models::holding::normalize_ticker;
use crate::models::price::{is_valid_price, PriceQuote, Quotes};
use crate::models::settings::PriceStrategy;
use crate::providers::traits::MarketDataSource;

/// Fetches latest prices for a set of tickers with time-windowed caching.
///
/// Cache strategy:
/// - Results are keyed by the exact (normalized) ticker set.
/// - A hit within the window never touches the network.
/// - Results with no resolved price are not cached, so the next pass retries.
///
/// Failure handling is per ticker: an unknown symbol is marked absent and the
/// rest of the set is unaffected. A failure of the whole request degrades to
/// empty `Quotes` and is logged, never returned.
pub struct PriceService {
    strategy: PriceStrategy,
}

impl PriceService {
    pub fn new(strategy: PriceStrategy) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn strategy(&self) -> PriceStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: PriceStrategy) {
        self.strategy = strategy;
    }

    /// Cached price lookup that never fails.
    pub async fn get_prices(
        &self,
        cache: &mut TtlCache<TickerSet, Quotes>,
        source: Option<&dyn MarketDataSource>,
        tickers: &[String],
    ) -> Quotes {
        let set: TickerSet = tickers
            .iter()
            .map(|t| normalize_ticker(t))
            .filter(|t| !t.is_empty())
            .collect();

        if set.is_empty() {
            return Quotes::new();
        }

        if let Some(quotes) = cache.get(&set) {
            debug!("Quotes for {} tickers served from cache", set.len());
            return quotes.clone();
        }

        let Some(source) = source else {
            warn!("No market-data source configured; no prices available");
            return Quotes::new();
        };

        match self.fetch_prices(source, &set).await {
            Ok(quotes) => {
                debug!(
                    "{} resolved {}/{} prices",
                    source.name(),
                    quotes.resolved_count(),
                    set.len()
                );
                let missing = quotes.missing();
                if !missing.is_empty() {
                    warn!("No price for: {}", missing.join(", "));
                }
                if quotes.has_prices() {
                    cache.insert(set, quotes.clone());
                }
                quotes
            }
            Err(e) => {
                warn!("Price fetch from {} failed: {e}", source.name());
                Quotes::new()
            }
        }
    }

    /// Uncached fetch with the configured strategy.
    pub async fn fetch_prices(
        &self,
        source: &dyn MarketDataSource,
        tickers: &TickerSet,
    ) -> Result<Quotes, CoreError> {
        match self.strategy {
            PriceStrategy::Batch => fetch_batch(source, tickers).await,
            PriceStrategy::PerTicker => Ok(fetch_per_ticker(source, tickers).await),
        }
    }
}

/// One intraday request; per ticker, the latest non-null close.
async fn fetch_batch(
    source: &dyn MarketDataSource,
    tickers: &TickerSet,
) -> Result<Quotes, CoreError> {
    let requested: Vec<String> = tickers.iter().cloned().collect();
    let series = source.intraday_closes(&requested).await?;

    let mut quotes = Quotes::new();
    for ticker in tickers {
        let last = series.get(ticker).and_then(|closes| {
            closes
                .iter()
                .rev()
                .filter_map(|close| *close)
                .find(|close| is_valid_price(*close))
        });
        match last {
            Some(price) => quotes.insert(ticker, price),
            None => quotes.mark_missing(ticker),
        }
    }
    Ok(quotes)
}

/// Daily bar per ticker, then the latest-quote call if that gave nothing.
async fn fetch_per_ticker(source: &dyn MarketDataSource, tickers: &TickerSet) -> Quotes {
    let mut quotes = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let daily = match source.daily_close(ticker).await {
            Ok(close) => close.filter(|p| is_valid_price(*p)),
            Err(e) => {
                debug!("Daily bar for {ticker} failed: {e}");
                None
            }
        };

        let price = match daily {
            Some(price) => Some(price),
            None => match source.latest_price(ticker).await {
                Ok(price) if is_valid_price(price) => Some(price),
                Ok(price) => {
                    debug!("Latest quote for {ticker} unusable: {price}");
                    None
                }
                Err(e) => {
                    debug!("Latest quote for {ticker} failed: {e}");
                    None
                }
            },
        };

        quotes.push(PriceQuote {
            ticker: ticker.clone(),
            last_price: price,
        });
    }
    quotes.into_iter().collect()
}
