// src/store/redis_store.rs
use async_trait::async_trait;
use log::{debug, info};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use super::{TickerStore, WriteOp};
use crate::error::StoreError;

#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Open a client, establish a multiplexed connection and ping it.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis ticker store connected ({})", redis_url);

        Ok(Self { conn })
    }

    fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

#[async_trait]
impl TickerStore for RedisStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let _: i64 = conn.zadd(key, member, score).await?;
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
        let offset = isize::try_from(offset).unwrap_or(isize::MAX);
        let count = isize::try_from(count).unwrap_or(isize::MAX);

        let mut conn = self.connection();
        let members: Vec<(String, f64)> = conn
            .zrevrangebyscore_limit_withscores(key, max, min, offset, count)
            .await?;
        Ok(members)
    }

    async fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                WriteOp::Set { key, value } => {
                    pipe.set(key, value).ignore();
                }
                WriteOp::ZAdd { key, member, score } => {
                    pipe.zadd(key, member, *score).ignore();
                }
            }
        }

        let mut conn = self.connection();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn clear_namespace(&self, namespace: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection();

        let pattern = format!("{}:*", namespace);
        let keys: Vec<String> = conn.keys(&pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 = conn.del(&keys).await?;

        debug!("🗑️ Cleared {} keys matching {}", deleted, pattern);

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
