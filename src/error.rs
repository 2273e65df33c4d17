// src/error.rs
use thiserror::Error;

/// Failure raised by a store adapter for a single command.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum TickerMetaError {
    #[error("Ticker source failed: {0}")]
    Source(String),

    #[error("Invalid ticker record: {0}")]
    InvalidRecord(String),

    #[error("Store write failed for key {key}: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Store read failed for key {key}: {source}")]
    StoreRead {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl TickerMetaError {
    pub fn read(key: impl Into<String>, source: StoreError) -> Self {
        Self::StoreRead { key: key.into(), source }
    }

    pub fn write(key: impl Into<String>, source: StoreError) -> Self {
        Self::StoreWrite { key: key.into(), source }
    }
}
