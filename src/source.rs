// src/source.rs
//! Ticker sources: replayable producers of `TickerRecord`s.
//!
//! A source yields one `Result` per record so a single malformed entry is
//! reported without ending the run.

use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::TickerMetaError;
use crate::types::TickerRecord;

pub type RecordStream<'a> = BoxStream<'a, Result<TickerRecord, TickerMetaError>>;

pub trait TickerSource: Send + Sync {
    fn name(&self) -> &str;

    /// A fresh pass over every record. Each call starts from the beginning.
    fn records(&self) -> RecordStream<'_>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<TickerRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<TickerRecord>) -> Self {
        Self { records }
    }
}

impl TickerSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn records(&self) -> RecordStream<'_> {
        stream::iter(self.records.iter().cloned().map(Ok)).boxed()
    }
}

/// JSON file holding either an array of records or one record per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    label: String,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = format!("file:{}", path.display());
        Self { path, label }
    }
}

impl TickerSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn records(&self) -> RecordStream<'_> {
        stream::once(tokio::fs::read_to_string(&self.path))
            .flat_map(|read| match read {
                Ok(body) => stream::iter(parse_records(&body)).boxed(),
                Err(e) => stream::iter(vec![Err(TickerMetaError::Io(e))]).boxed(),
            })
            .boxed()
    }
}

/// Records fetched as a JSON array from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpJsonSource {
    url: String,
    token: Option<String>,
    client: Client,
}

impl HttpJsonSource {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, TickerMetaError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            url: url.into(),
            token,
            client,
        })
    }

    async fn fetch(&self) -> Result<String, TickerMetaError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.text().await?;

        debug!("Fetched {} bytes of ticker data from {}", body.len(), self.url);

        Ok(body)
    }
}

impl TickerSource for HttpJsonSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn records(&self) -> RecordStream<'_> {
        stream::once(self.fetch())
            .flat_map(|fetched| match fetched {
                Ok(body) => stream::iter(parse_records(&body)).boxed(),
                Err(e) => stream::iter(vec![Err(e)]).boxed(),
            })
            .boxed()
    }
}

/// Build the source described by the configuration.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn TickerSource>, TickerMetaError> {
    let source: Box<dyn TickerSource> = match config {
        SourceConfig::File(path) => Box::new(JsonFileSource::new(path)),
        SourceConfig::Http { url, token } => Box::new(HttpJsonSource::new(url, token.clone())?),
    };
    info!("Ticker source: {}", source.name());
    Ok(source)
}

/// Parse a JSON array or newline-delimited JSON into per-record results.
pub fn parse_records(body: &str) -> Vec<Result<TickerRecord, TickerMetaError>> {
    let trimmed = body.trim_start();

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Vec<Value>>(trimmed) {
            Ok(values) => values.into_iter().map(record_from_value).collect(),
            Err(e) => vec![Err(TickerMetaError::Source(format!(
                "ticker list is not a JSON array: {}",
                e
            )))],
        };
    }

    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<TickerRecord>(line).map_err(|e| {
                TickerMetaError::Source(format!("line {}: {}", idx + 1, e))
            })
        })
        .collect()
}

fn record_from_value(value: Value) -> Result<TickerRecord, TickerMetaError> {
    serde_json::from_value(value).map_err(|e| TickerMetaError::Source(e.to_string()))
}
