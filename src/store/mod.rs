// src/store/mod.rs
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StoreBackend, TickerMetaConfig};
use crate::error::{StoreError, TickerMetaError};

pub use memory::InMemoryStore;
pub use redis_store::RedisStore;

/// A single mutation, used to submit groups of writes at once.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { key: String, value: String },
    ZAdd { key: String, member: String, score: f64 },
}

impl WriteOp {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Set { key, .. } | WriteOp::ZAdd { key, .. } => key,
        }
    }
}

/// Key-value plus sorted-set substrate the index is written into.
///
/// Every call is independently atomic at the store; callers never hold a
/// lock across calls.
#[async_trait]
pub trait TickerStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;

    /// `ZREVRANGEBYSCORE key max min WITHSCORES LIMIT offset count`: highest
    /// score first, equal scores in reverse lexicographic order.
    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: f64,
        min: f64,
        offset: usize,
        count: usize,
    ) -> Result<Vec<(String, f64)>, StoreError>;

    /// Apply all operations as one group. Adapters that can make the group
    /// atomic do so.
    async fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError>;

    /// Drop every key under `namespace`, returning how many were removed.
    async fn clear_namespace(&self, namespace: &str) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the store selected by the configuration.
pub async fn connect(config: &TickerMetaConfig) -> Result<Arc<dyn TickerStore>, TickerMetaError> {
    match config.store_backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url)
                .await
                .map_err(|e| TickerMetaError::Config(format!("Failed to connect to Redis: {}", e)))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
    }
}
