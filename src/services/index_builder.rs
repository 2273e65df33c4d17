// src/services/index_builder.rs
use chrono::Utc;
use futures::future::try_join_all;
use futures::stream::{self, Stream, StreamExt};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::retry::RetryPolicy;
use crate::config::TickerMetaConfig;
use crate::error::{StoreError, TickerMetaError};
use crate::keys::{
    bucket_of, char_len, char_prefix, AutocompleteKeyBuilder, LookupKeyBuilder, LookupKind,
    MAX_NAME_CHARS, PREFIX_SCORE, SUFFIX_MARKER, TERMINAL_SCORE,
};
use crate::source::TickerSource;
use crate::store::{TickerStore, WriteOp};
use crate::types::{BuildReport, TickerRecord};

/// Every store write needed to index one record.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPlan {
    pub record: TickerRecord,
    /// Terminal entry plus both lookup entries, applied together.
    pub group: Vec<WriteOp>,
    /// One entry per proper prefix, each in its own length set.
    pub prefixes: Vec<WriteOp>,
}

#[derive(Default)]
struct BuildCounters {
    seen: AtomicUsize,
    indexed: AtomicUsize,
    rejected: AtomicUsize,
    failed: AtomicUsize,
    source_errors: AtomicUsize,
}

impl BuildCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn fill(&self, report: &mut BuildReport) {
        report.records_seen = self.seen.load(Ordering::Relaxed);
        report.records_indexed = self.indexed.load(Ordering::Relaxed);
        report.records_rejected = self.rejected.load(Ordering::Relaxed);
        report.records_failed = self.failed.load(Ordering::Relaxed);
        report.source_errors = self.source_errors.load(Ordering::Relaxed);
    }
}

pub struct IndexBuilder {
    store: Arc<dyn TickerStore>,
    namespace: String,
    autocomplete_keys: AutocompleteKeyBuilder,
    lookup_keys: LookupKeyBuilder,
    concurrency: usize,
    retry: RetryPolicy,
}

impl IndexBuilder {
    pub fn new(store: Arc<dyn TickerStore>, config: &TickerMetaConfig) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            autocomplete_keys: AutocompleteKeyBuilder::new(&config.namespace),
            lookup_keys: LookupKeyBuilder::new(&config.namespace),
            concurrency: config.build_concurrency.max(1),
            retry: config.write_retry,
        }
    }

    pub fn plan(&self, record: &TickerRecord) -> Result<IndexPlan, TickerMetaError> {
        let record = record.normalized();
        let name = record.company_name.as_str();

        let bucket = bucket_of(name).ok_or_else(|| {
            TickerMetaError::InvalidRecord(format!("empty company name for ticker '{}'", record.ticker))
        })?;
        if record.ticker.is_empty() {
            return Err(TickerMetaError::InvalidRecord(format!(
                "empty ticker for company '{}'",
                name
            )));
        }
        if name.contains(SUFFIX_MARKER) {
            return Err(TickerMetaError::InvalidRecord(format!(
                "company name '{}' contains the reserved terminal marker",
                name
            )));
        }

        let len = char_len(name);
        if len > MAX_NAME_CHARS {
            return Err(TickerMetaError::InvalidRecord(format!(
                "company name for '{}' is {} characters, limit is {}",
                record.ticker, len, MAX_NAME_CHARS
            )));
        }
        if let Some(field) = record.reserved_attribute() {
            return Err(TickerMetaError::InvalidRecord(format!(
                "attribute '{}' on '{}' shadows a record field",
                field, name
            )));
        }

        let value = serde_json::to_string(&record)?;

        let group = vec![
            WriteOp::ZAdd {
                key: self.autocomplete_keys.partition_key(bucket, len),
                member: AutocompleteKeyBuilder::terminal_member(name),
                score: TERMINAL_SCORE,
            },
            WriteOp::Set {
                key: self.lookup_keys.key(LookupKind::ByCompanyName, name),
                value: value.clone(),
            },
            WriteOp::Set {
                key: self.lookup_keys.key(LookupKind::ByTicker, &record.ticker),
                value,
            },
        ];

        let prefixes = (1..len)
            .map(|i| WriteOp::ZAdd {
                key: self.autocomplete_keys.partition_key(bucket, i),
                member: char_prefix(name, i).to_string(),
                score: PREFIX_SCORE,
            })
            .collect();

        Ok(IndexPlan {
            record,
            group,
            prefixes,
        })
    }

    /// Write one record's autocomplete and lookup entries. Also the repair
    /// path for a record whose earlier writes were interrupted.
    pub async fn index_record(&self, record: &TickerRecord) -> Result<(), TickerMetaError> {
        let plan = self.plan(record)?;

        let group_key = plan.group[0].key().to_string();
        self.retry
            .run(&group_key, || self.store.apply(&plan.group))
            .await
            .map_err(|e| TickerMetaError::write(&group_key, e))?;

        try_join_all(plan.prefixes.iter().map(|op| async move {
            self.retry
                .run(op.key(), || self.write_one(op))
                .await
                .map_err(|e| TickerMetaError::write(op.key(), e))
        }))
        .await?;

        debug!(
            "Indexed {} ({}) with {} prefix entries",
            plan.record.company_name,
            plan.record.ticker,
            plan.prefixes.len()
        );

        Ok(())
    }

    /// Consume a record stream once. Bad records and failed writes are
    /// logged and counted; the stream is always drained.
    pub async fn build<S>(&self, records: S) -> BuildReport
    where
        S: Stream<Item = Result<TickerRecord, TickerMetaError>> + Send,
    {
        let mut report = BuildReport::start();
        let counters = BuildCounters::default();

        records
            .for_each_concurrent(self.concurrency, |item| {
                let counters = &counters;
                async move {
                    let record = match item {
                        Ok(record) => record,
                        Err(e) => {
                            warn!("⚠️ Ticker source error: {}", e);
                            BuildCounters::bump(&counters.source_errors);
                            return;
                        }
                    };

                    BuildCounters::bump(&counters.seen);
                    match self.index_record(&record).await {
                        Ok(()) => BuildCounters::bump(&counters.indexed),
                        Err(TickerMetaError::InvalidRecord(reason)) => {
                            warn!("Skipping ticker record: {}", reason);
                            BuildCounters::bump(&counters.rejected);
                        }
                        Err(e) => {
                            error!(
                                "Failed to index {} ({}): {}",
                                record.company_name, record.ticker, e
                            );
                            BuildCounters::bump(&counters.failed);
                        }
                    }
                }
            })
            .await;

        counters.fill(&mut report);
        report.finished_at = Some(Utc::now());

        info!(
            "📦 Build {} finished: {} indexed, {} rejected, {} failed, {} source errors ({}ms)",
            report.run_id,
            report.records_indexed,
            report.records_rejected,
            report.records_failed,
            report.source_errors,
            report.duration_ms().unwrap_or_default()
        );

        report
    }

    /// Replay `source` into the index, optionally dropping everything under
    /// the namespace first so renamed or delisted companies disappear.
    ///
    /// The namespace is only cleared once the source has produced its first
    /// record. A source that yields nothing but errors leaves the current
    /// index in place.
    pub async fn rebuild(
        &self,
        source: &dyn TickerSource,
        clear: bool,
    ) -> Result<BuildReport, TickerMetaError> {
        info!("🔄 Rebuilding ticker index from {}", source.name());

        let mut records = source.records();
        let mut head = Vec::new();
        let mut produced = false;
        while let Some(item) = records.next().await {
            produced = item.is_ok();
            head.push(item);
            if produced {
                break;
            }
        }

        let cleared = match (clear, produced) {
            (true, true) => self.clear().await?,
            (true, false) => {
                warn!(
                    "⚠️ {} produced no records; keeping the existing index under '{}'",
                    source.name(),
                    self.namespace
                );
                0
            }
            (false, _) => 0,
        };

        let mut report = self.build(stream::iter(head).chain(records)).await;
        report.cleared_keys = cleared;
        Ok(report)
    }

    /// Remove every autocomplete and lookup entry under the namespace.
    pub async fn clear(&self) -> Result<u64, TickerMetaError> {
        let cleared = self
            .store
            .clear_namespace(&self.namespace)
            .await
            .map_err(|e| TickerMetaError::write(format!("{}:*", self.namespace), e))?;
        info!("🗑️ Cleared {} keys under '{}'", cleared, self.namespace);
        Ok(cleared)
    }

    async fn write_one(&self, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Set { key, value } => self.store.set(key, value).await,
            WriteOp::ZAdd { key, member, score } => self.store.zadd(key, member, *score).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn builder() -> IndexBuilder {
        IndexBuilder::new(
            Arc::new(InMemoryStore::new()),
            &TickerMetaConfig::in_memory("t"),
        )
    }

    #[test]
    fn plan_writes_one_terminal_and_len_minus_one_prefixes() {
        let plan = builder().plan(&TickerRecord::new("Amazon", "AMZN")).unwrap();

        assert_eq!(plan.prefixes.len(), 5);
        assert_eq!(
            plan.group[0],
            WriteOp::ZAdd {
                key: "t:autocomplete:A:6".into(),
                member: "Amazon§§§".into(),
                score: TERMINAL_SCORE,
            }
        );
        assert_eq!(
            plan.prefixes[2],
            WriteOp::ZAdd {
                key: "t:autocomplete:A:3".into(),
                member: "Ama".into(),
                score: PREFIX_SCORE,
            }
        );

        let keys: Vec<&str> = plan.group[1..].iter().map(WriteOp::key).collect();
        assert_eq!(
            keys,
            vec!["t:lookup:by_company_name:Amazon", "t:lookup:by_ticker:AMZN"]
        );
    }

    #[test]
    fn single_character_name_has_no_prefixes() {
        let plan = builder().plan(&TickerRecord::new("X", "X")).unwrap();
        assert!(plan.prefixes.is_empty());
        assert_eq!(plan.group[0].key(), "t:autocomplete:X:1");
    }

    #[test]
    fn multibyte_names_split_on_characters() {
        let plan = builder().plan(&TickerRecord::new("삼성전자", "005930")).unwrap();
        let members: Vec<String> = plan
            .prefixes
            .iter()
            .map(|op| match op {
                WriteOp::ZAdd { member, .. } => member.clone(),
                WriteOp::Set { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(members, vec!["삼", "삼성", "삼성전"]);
        assert_eq!(plan.group[0].key(), "t:autocomplete:삼:4");
    }

    #[test]
    fn plan_rejects_blank_or_marked_names() {
        let builder = builder();
        assert!(matches!(
            builder.plan(&TickerRecord::new("   ", "AAA")),
            Err(TickerMetaError::InvalidRecord(_))
        ));
        assert!(matches!(
            builder.plan(&TickerRecord::new("Acme", " ")),
            Err(TickerMetaError::InvalidRecord(_))
        ));
        assert!(matches!(
            builder.plan(&TickerRecord::new("Acme§§§", "ACME")),
            Err(TickerMetaError::InvalidRecord(_))
        ));
    }

    #[test]
    fn plan_rejects_attributes_shadowing_record_fields() {
        let builder = builder();
        for field in ["ticker", "companyName"] {
            let record =
                TickerRecord::new("Acme", "ACME").with_attribute(field, serde_json::json!("other"));
            assert!(matches!(
                builder.plan(&record),
                Err(TickerMetaError::InvalidRecord(_))
            ));
        }
    }

    #[test]
    fn plan_rejects_names_past_the_length_cap() {
        let builder = builder();
        let longest = "A".repeat(MAX_NAME_CHARS);
        assert!(builder.plan(&TickerRecord::new(longest, "LONG")).is_ok());

        let too_long = "A".repeat(MAX_NAME_CHARS + 1);
        assert!(matches!(
            builder.plan(&TickerRecord::new(too_long, "LONG")),
            Err(TickerMetaError::InvalidRecord(_))
        ));
    }
}
