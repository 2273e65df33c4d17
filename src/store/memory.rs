// src/store/memory.rs
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{TickerStore, WriteOp};
use crate::error::StoreError;

/// Process-local store with Redis ordering semantics. Used for tests and for
/// running the server without a Redis instance.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<HashMap<String, String>>,
    sorted_sets: RwLock<HashMap<String, HashMap<String, f64>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys across both keyspaces.
    pub async fn key_count(&self) -> usize {
        self.values.read().await.len() + self.sorted_sets.read().await.len()
    }

    /// Members of one sorted set with their scores, in no particular order.
    pub async fn members(&self, key: &str) -> Vec<(String, f64)> {
        self.sorted_sets
            .read()
            .await
            .get(key)
            .map(|set| set.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default()
    }

    fn apply_locked(
        values: &mut HashMap<String, String>,
        sorted_sets: &mut HashMap<String, HashMap<String, f64>>,
        op: &WriteOp,
    ) {
        match op {
            WriteOp::Set { key, value } => {
                values.insert(key.clone(), value.clone());
            }
            WriteOp::ZAdd { key, member, score } => {
                sorted_sets
                    .entry(key.clone())
                    .or_default()
                    .insert(member.clone(), *score);
            }
        }
    }
}

#[async_trait]
impl TickerStore for InMemoryStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        self.sorted_sets
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrevrangebyscore(
        &self,
        key: &str,
        max: f64,
        min: f64,
        offset: usize,
        count: usize,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let sets = self.sorted_sets.read().await;
        let Some(set) = sets.get(key) else {
            return Ok(Vec::new());
        };

        let mut members: Vec<(String, f64)> = set
            .iter()
            .filter(|(_, score)| **score >= min && **score <= max)
            .map(|(member, score)| (member.clone(), *score))
            .collect();

        members.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        Ok(members.into_iter().skip(offset).take(count).collect())
    }

    async fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        let mut sorted_sets = self.sorted_sets.write().await;
        for op in ops {
            Self::apply_locked(&mut values, &mut sorted_sets, op);
        }
        Ok(())
    }

    async fn clear_namespace(&self, namespace: &str) -> Result<u64, StoreError> {
        let prefix = format!("{}:", namespace);
        let mut values = self.values.write().await;
        let mut sorted_sets = self.sorted_sets.write().await;

        let before = values.len() + sorted_sets.len();
        values.retain(|key, _| !key.starts_with(&prefix));
        sorted_sets.retain(|key, _| !key.starts_with(&prefix));

        Ok((before - values.len() - sorted_sets.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
