// src/services/autocomplete.rs
use futures::stream::{self, StreamExt};
use log::{debug, error};
use std::sync::Arc;

use crate::config::TickerMetaConfig;
use crate::error::TickerMetaError;
use crate::keys::{bucket_of, char_len, AutocompleteKeyBuilder, MAX_NAME_CHARS};
use crate::store::TickerStore;

/// Prefix search over the per-length sorted sets written by the index
/// builder.
pub struct AutocompleteEngine {
    store: Arc<dyn TickerStore>,
    keys: AutocompleteKeyBuilder,
    probe_concurrency: usize,
    max_probe_length: Option<usize>,
}

impl AutocompleteEngine {
    pub fn new(store: Arc<dyn TickerStore>, config: &TickerMetaConfig) -> Self {
        Self {
            store,
            keys: AutocompleteKeyBuilder::new(&config.namespace),
            probe_concurrency: config.probe_concurrency.max(1),
            max_probe_length: config.max_probe_length,
        }
    }

    /// Company names starting with `query`, at most `limit` of them.
    ///
    /// Probes the set for every length from the query length up to `limit`
    /// (or the configured maximum probe length), never past
    /// [`MAX_NAME_CHARS`], passing the score bounds and `offset`/`limit` to
    /// each range query. Names are returned in probe order, shortest first;
    /// within one length the store's reverse score order is kept.
    pub async fn search(
        &self,
        query: &str,
        min_score: f64,
        max_score: f64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<String>, TickerMetaError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let keyword = query.trim();
        let Some(bucket) = bucket_of(keyword) else {
            return Ok(Vec::new());
        };

        let query_len = char_len(keyword);
        if query_len > MAX_NAME_CHARS {
            return Ok(Vec::new());
        }
        let upper = self
            .max_probe_length
            .unwrap_or(limit)
            .clamp(query_len, MAX_NAME_CHARS);

        let store = &self.store;
        let keys = &self.keys;
        let probes = stream::iter(query_len..=upper)
            .map(|len| {
                let key = keys.partition_key(bucket, len);
                async move {
                    let page = store
                        .zrevrangebyscore(&key, max_score, min_score, offset, limit)
                        .await;
                    page.map_err(|e| {
                        error!("Autocomplete probe {} failed: {}", key, e);
                        TickerMetaError::read(key, e)
                    })
                }
            })
            .buffered(self.probe_concurrency);
        futures::pin_mut!(probes);

        let mut results = Vec::new();
        while let Some(page) = probes.next().await {
            for (member, _score) in page? {
                if results.len() == limit {
                    break;
                }
                if let Some(name) = accept(&member, keyword, query_len) {
                    results.push(name.to_string());
                }
            }
            if results.len() >= limit {
                break;
            }
        }

        debug!("Autocomplete '{}' -> {} names", keyword, results.len());

        Ok(results)
    }
}

/// Company name carried by `member` if it is a terminal entry whose leading
/// characters match `keyword`.
fn accept<'a>(member: &'a str, keyword: &str, keyword_len: usize) -> Option<&'a str> {
    let name = AutocompleteKeyBuilder::strip_terminal(member)?;
    let compared = char_len(name).min(keyword_len);
    name.chars()
        .zip(keyword.chars())
        .take(compared)
        .all(|(a, b)| a == b)
        .then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_matching_terminals() {
        assert_eq!(accept("Amazon§§§", "Ama", 3), Some("Amazon"));
        assert_eq!(accept("Amazon", "Ama", 3), None);
        assert_eq!(accept("Apple§§§", "Ama", 3), None);
        assert_eq!(accept("amazon§§§", "Ama", 3), None);
        assert_eq!(accept(" Amazon§§§ ", "Ama", 3), Some("Amazon"));
    }
}
