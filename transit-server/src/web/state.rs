//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::{CacheConfig, QuoteCache};
use crate::service::TransitService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Journeys, fares and tickets
    pub service: Arc<TransitService>,

    /// Quotes awaiting booking
    pub quotes: Arc<QuoteCache>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(service: TransitService, cache_config: &CacheConfig) -> Self {
        Self {
            service: Arc::new(service),
            quotes: Arc::new(QuoteCache::new(cache_config)),
        }
    }
}
