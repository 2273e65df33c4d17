// src/services/lookup_cache.rs
use log::{debug, error, warn};
use std::sync::Arc;

use crate::config::TickerMetaConfig;
use crate::error::TickerMetaError;
use crate::keys::{LookupKeyBuilder, LookupKind};
use crate::store::TickerStore;
use crate::types::TickerRecord;

/// Exact-match resolver over the `by_company_name` and `by_ticker` entries.
pub struct LookupCache {
    store: Arc<dyn TickerStore>,
    keys: LookupKeyBuilder,
}

impl LookupCache {
    pub fn new(store: Arc<dyn TickerStore>, config: &TickerMetaConfig) -> Self {
        Self {
            store,
            keys: LookupKeyBuilder::new(&config.namespace),
        }
    }

    /// Resolve by company name.
    pub async fn resolve(&self, query: &str) -> Result<Option<TickerRecord>, TickerMetaError> {
        self.resolve_by_company_name(query).await
    }

    pub async fn resolve_by_company_name(
        &self,
        company_name: &str,
    ) -> Result<Option<TickerRecord>, TickerMetaError> {
        self.lookup(LookupKind::ByCompanyName, company_name).await
    }

    pub async fn resolve_by_ticker(
        &self,
        ticker: &str,
    ) -> Result<Option<TickerRecord>, TickerMetaError> {
        self.lookup(LookupKind::ByTicker, ticker).await
    }

    /// Company name first, then ticker.
    pub async fn resolve_any(&self, query: &str) -> Result<Option<TickerRecord>, TickerMetaError> {
        match self.resolve_by_company_name(query).await? {
            Some(record) => Ok(Some(record)),
            None => self.resolve_by_ticker(query).await,
        }
    }

    async fn lookup(
        &self,
        kind: LookupKind,
        value: &str,
    ) -> Result<Option<TickerRecord>, TickerMetaError> {
        if value.trim().is_empty() {
            return Ok(None);
        }

        let key = self.keys.key(kind, value);
        let fetched = self.store.get(&key).await;
        let cached = match fetched {
            Ok(cached) => cached,
            Err(e) => {
                error!("Lookup cache get error for {}: {}", key, e);
                return Err(TickerMetaError::read(key, e));
            }
        };

        match cached {
            Some(json) => {
                let record = serde_json::from_str::<TickerRecord>(&json).map_err(|e| {
                    warn!("Failed to parse cached ticker record for {}: {}", key, e);
                    TickerMetaError::Serialization(e)
                })?;
                debug!("🎯 Lookup cache HIT for {}", key);
                Ok(Some(record))
            }
            None => {
                debug!("💾 Lookup cache MISS for {}", key);
                Ok(None)
            }
        }
    }
}
