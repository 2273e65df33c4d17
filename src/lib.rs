// src/lib.rs
pub mod config;
pub mod error;
pub mod keys;
pub mod server;
pub mod services;
pub mod source;
pub mod store;
pub mod types;

pub use config::TickerMetaConfig;
pub use error::{StoreError, TickerMetaError};
pub use services::{AutocompleteEngine, IndexBuilder, LookupCache, TickerMetaService};
pub use source::TickerSource;
pub use store::{InMemoryStore, RedisStore, TickerStore};
pub use types::{BuildReport, TickerRecord};
