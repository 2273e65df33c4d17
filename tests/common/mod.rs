// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ticker_meta_cache::store::WriteOp;
use ticker_meta_cache::{
    InMemoryStore, StoreError, TickerMetaConfig, TickerMetaService, TickerRecord, TickerStore,
};

pub const NAMESPACE: &str = "test";

pub fn config() -> TickerMetaConfig {
    TickerMetaConfig::in_memory(NAMESPACE)
}

pub fn memory_service() -> (Arc<InMemoryStore>, TickerMetaService) {
    let store = Arc::new(InMemoryStore::new());
    let service = TickerMetaService::new(store.clone(), &config());
    (store, service)
}

pub fn amazon_and_apple() -> Vec<TickerRecord> {
    vec![
        TickerRecord::new("Amazon", "AMZN"),
        TickerRecord::new("Apple", "AAPL"),
    ]
}

/// Wraps an in-memory store, failing any write that touches a key or member
/// containing `poison`, and failing every read while `reads_down` is set.
pub struct FlakyStore {
    pub inner: InMemoryStore,
    poison: String,
    reads_down: AtomicBool,
}

impl FlakyStore {
    pub fn new(poison: impl Into<String>) -> Self {
        Self {
            inner: InMemoryStore::new(),
            poison: poison.into(),
            reads_down: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self) {
        self.reads_down.store(true, Ordering::SeqCst);
    }

    fn check_write(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        if key.contains(&self.poison) || payload.contains(&self.poison) {
            Err(StoreError::Unavailable(format!("write rejected for {}", key)))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.reads_down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TickerStore for FlakyStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_write(key, value)?;
        self.inner.set(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_read()?;
        self.inner.get(key).await
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        self.check_write(key, member)?;
        self.inner.zadd(key, member, score).await
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: f64,
        min: f64,
        offset: usize,
        count: usize,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        self.check_read()?;
        self.inner.zrevrangebyscore(key, max, min, offset, count).await
    }

    async fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        for op in ops {
            match op {
                WriteOp::Set { key, value } => self.check_write(key, value)?,
                WriteOp::ZAdd { key, member, .. } => self.check_write(key, member)?,
            }
        }
        self.inner.apply(ops).await
    }

    async fn clear_namespace(&self, namespace: &str) -> Result<u64, StoreError> {
        self.inner.clear_namespace(namespace).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_read()
    }
}
