// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Serialized field names owned by [`TickerRecord`]; an attribute under one
/// of these would collide with the field when flattened.
pub const RESERVED_ATTRIBUTES: [&str; 2] = ["companyName", "ticker"];

/// One instrument as delivered by a crawl. Anything besides the company name
/// and ticker rides along in `attributes` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRecord {
    pub company_name: String,
    pub ticker: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TickerRecord {
    pub fn new(company_name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ticker: ticker.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// First attribute whose name shadows a record field, if any.
    pub fn reserved_attribute(&self) -> Option<&str> {
        RESERVED_ATTRIBUTES
            .into_iter()
            .find(|name| self.attributes.contains_key(*name))
    }

    /// Copy with surrounding whitespace removed from the name and ticker.
    pub fn normalized(&self) -> Self {
        Self {
            company_name: self.company_name.trim().to_string(),
            ticker: self.ticker.trim().to_string(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Summary of a single ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cleared_keys: u64,
    pub records_seen: usize,
    pub records_indexed: usize,
    pub records_rejected: usize,
    pub records_failed: usize,
    pub source_errors: usize,
}

impl BuildReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            cleared_keys: 0,
            records_seen: 0,
            records_indexed: 0,
            records_rejected: 0,
            records_failed: 0,
            source_errors: 0,
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// True when every record the source produced made it into the store.
    pub fn is_clean(&self) -> bool {
        self.records_rejected == 0 && self.records_failed == 0 && self.source_errors == 0
    }
}
