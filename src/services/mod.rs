// src/services/mod.rs
pub mod autocomplete;
pub mod index_builder;
pub mod lookup_cache;
pub mod retry;

use std::sync::Arc;

use crate::config::TickerMetaConfig;
use crate::error::TickerMetaError;
use crate::store::{self, TickerStore};

pub use autocomplete::AutocompleteEngine;
pub use index_builder::{IndexBuilder, IndexPlan};
pub use lookup_cache::LookupCache;
pub use retry::RetryPolicy;

/// Builder, search engine and lookup cache sharing one store handle.
pub struct TickerMetaService {
    pub builder: IndexBuilder,
    pub autocomplete: AutocompleteEngine,
    pub lookup: LookupCache,
    store: Arc<dyn TickerStore>,
}

impl TickerMetaService {
    pub fn new(store: Arc<dyn TickerStore>, config: &TickerMetaConfig) -> Self {
        Self {
            builder: IndexBuilder::new(store.clone(), config),
            autocomplete: AutocompleteEngine::new(store.clone(), config),
            lookup: LookupCache::new(store.clone(), config),
            store,
        }
    }

    /// Open the configured store and wire the services over it.
    pub async fn connect(config: &TickerMetaConfig) -> Result<Self, TickerMetaError> {
        let store = store::connect(config).await?;
        Ok(Self::new(store, config))
    }

    pub async fn health_check(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}
