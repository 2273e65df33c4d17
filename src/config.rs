// src/config.rs
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::services::retry::RetryPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("Unknown store backend: {}", other)),
        }
    }
}

/// Where the ingestion job pulls ticker records from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceConfig {
    File(PathBuf),
    Http { url: String, token: Option<String> },
}

/// Defaults applied when a search caller leaves score bounds or limit out.
#[derive(Clone, Copy, Debug)]
pub struct SearchDefaults {
    pub min_score: f64,
    pub max_score: f64,
    pub limit: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            max_score: 1.0,
            limit: 10,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TickerMetaConfig {
    pub redis_url: String,
    pub store_backend: StoreBackend,
    pub namespace: String,
    pub build_concurrency: usize,
    pub probe_concurrency: usize,
    pub max_probe_length: Option<usize>,
    pub write_retry: RetryPolicy,
    pub clear_before_rebuild: bool,
    pub source: Option<SourceConfig>,
    pub search: SearchDefaults,
    pub port: u16,
    /// Bearer token required by `POST /admin/rebuild` when set.
    pub admin_token: Option<String>,
}

impl Default for TickerMetaConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/".to_string(),
            store_backend: StoreBackend::Redis,
            namespace: "ticker".to_string(),
            build_concurrency: 16,
            probe_concurrency: 4,
            max_probe_length: None,
            write_retry: RetryPolicy::default(),
            clear_before_rebuild: true,
            source: None,
            search: SearchDefaults::default(),
            port: 8080,
            admin_token: None,
        }
    }
}

impl TickerMetaConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let redis_url = env::var("REDIS_URL").unwrap_or(defaults.redis_url);
        Url::parse(&redis_url).with_context(|| format!("Invalid REDIS_URL: {}", redis_url))?;

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.store_backend,
        };

        let namespace = env::var("TICKER_NAMESPACE").unwrap_or(defaults.namespace);
        if namespace.is_empty() {
            return Err(anyhow!("TICKER_NAMESPACE must not be empty"));
        }

        let source = match (env::var("TICKER_SOURCE_FILE"), env::var("TICKER_SOURCE_URL")) {
            (Ok(path), _) => Some(SourceConfig::File(PathBuf::from(path))),
            (Err(_), Ok(url)) => {
                Url::parse(&url).with_context(|| format!("Invalid TICKER_SOURCE_URL: {}", url))?;
                Some(SourceConfig::Http {
                    url,
                    token: env::var("TICKER_SOURCE_TOKEN").ok(),
                })
            }
            _ => None,
        };

        let write_retry = RetryPolicy::new(
            parse_or("WRITE_MAX_ATTEMPTS", defaults.write_retry.max_attempts)?.max(1),
            Duration::from_millis(parse_or("WRITE_RETRY_BACKOFF_MS", 50u64)?),
        );

        Ok(Self {
            redis_url,
            store_backend,
            namespace,
            build_concurrency: parse_or("BUILD_CONCURRENCY", defaults.build_concurrency)?.max(1),
            probe_concurrency: parse_or("PROBE_CONCURRENCY", defaults.probe_concurrency)?.max(1),
            max_probe_length: parse_opt("MAX_PROBE_LENGTH")?,
            write_retry,
            clear_before_rebuild: parse_or("CLEAR_BEFORE_REBUILD", defaults.clear_before_rebuild)?,
            source,
            search: SearchDefaults {
                min_score: parse_or("SEARCH_MIN_SCORE", defaults.search.min_score)?,
                max_score: parse_or("SEARCH_MAX_SCORE", defaults.search.max_score)?,
                limit: parse_or("SEARCH_DEFAULT_LIMIT", defaults.search.limit)?,
            },
            port: parse_or("PORT", defaults.port)?,
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        })
    }

    /// In-memory configuration used by tests and local runs.
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

fn parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid {}={}: {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(name)?.unwrap_or(default))
}
