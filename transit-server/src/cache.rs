//! Short-lived store for price quotes.
//!
//! A quote is a priced journey handed to a client under an opaque id. The
//! client books it by sending the id back, so the price charged is exactly
//! the one quoted. Quotes expire after a few minutes and are never
//! persisted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fares::PricedJourney;

const QUOTE_ID_LEN: usize = 16;

/// Error for an invalid quote id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quote id: {0}")]
pub struct InvalidQuoteId(String);

/// Opaque quote identifier: 16 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuoteId(String);

impl QuoteId {
    pub fn parse(s: &str) -> Result<Self, InvalidQuoteId> {
        let valid = s.len() == QUOTE_ID_LEN
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid {
            return Err(InvalidQuoteId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:016x}", rng.r#gen::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for QuoteId {
    type Error = InvalidQuoteId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<QuoteId> for String {
    fn from(id: QuoteId) -> Self {
        id.0
    }
}

/// Configuration for the quote cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a quote can be booked after it is issued.
    pub ttl: Duration,

    /// Maximum number of live quotes.
    pub max_capacity: u64,
}

impl CacheConfig {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self { ttl, max_capacity }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Priced journeys keyed by quote id.
pub struct QuoteCache {
    quotes: MokaCache<QuoteId, Arc<PricedJourney>>,
}

impl QuoteCache {
    pub fn new(config: &CacheConfig) -> Self {
        let quotes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { quotes }
    }

    /// Store a priced journey and return the id to book it by.
    pub async fn insert(&self, priced: PricedJourney) -> QuoteId {
        let id = QuoteId::generate(&mut rand::thread_rng());
        self.quotes.insert(id.clone(), Arc::new(priced)).await;
        id
    }

    /// Look up a quote that has not yet expired.
    pub async fn get(&self, id: &QuoteId) -> Option<Arc<PricedJourney>> {
        self.quotes.get(id).await
    }

    /// Number of live quotes (approximate, for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.quotes.entry_count()
    }

    /// Drop every quote, e.g. after fares change.
    pub fn invalidate_all(&self) {
        self.quotes.invalidate_all();
    }
}
