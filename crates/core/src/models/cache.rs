use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

use super::price::Quotes;
use super::rate::ExchangeRate;

/// Time-windowed memo of provider results.
///
/// Each entry remembers when it expires; `get` only returns entries whose
/// window has not elapsed. Uses `tokio::time::Instant` so paused-clock tests
/// can move time forward deterministically.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &K) -> Option<&V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| &entry.value)
    }

    /// Store `value` for the cache's default window.
    pub fn insert(&mut self, key: K, value: V) {
        let ttl = self.ttl;
        self.insert_for(key, value, ttl);
    }

    /// Store `value` for an explicit window.
    pub fn insert_for(&mut self, key: K, value: V, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry regardless of age.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache key for exchange rates: (base, quote), uppercased.
pub type RateKey = (String, String);

/// Cache key for quotes: the exact normalized set of requested tickers.
pub type TickerSet = BTreeSet<String>;

/// The two provider caches a monitor owns, one per provider function.
#[derive(Debug, Clone)]
pub struct ProviderCache {
    pub rates: TtlCache<RateKey, ExchangeRate>,
    pub quotes: TtlCache<TickerSet, Quotes>,
}

impl ProviderCache {
    pub fn new(rate_ttl: Duration, quote_ttl: Duration) -> Self {
        Self {
            rates: TtlCache::new(rate_ttl),
            quotes: TtlCache::new(quote_ttl),
        }
    }

    /// Force-refresh: forget everything in both caches.
    pub fn invalidate(&mut self) {
        self.rates.invalidate();
        self.quotes.invalidate();
    }

    /// (rate entries, quote entries)
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        (self.rates.len(), self.quotes.len())
    }
}
