// src/keys.rs
//! Key layout for the autocomplete index and the lookup cache.
//!
//! Autocomplete sets live under `{ns}:autocomplete:{bucket}:{len}`, one sorted
//! set per first character and prefix length. Lookup entries live under
//! `{ns}:lookup:by_company_name:{name}` and `{ns}:lookup:by_ticker:{TICKER}`.

use serde::{Deserialize, Serialize};

/// Appended to a full company name to mark a terminal entry. Never part of a
/// real company name.
pub const SUFFIX_MARKER: &str = "§§§";

pub const TERMINAL_SCORE: f64 = 1.0;
pub const PREFIX_SCORE: f64 = 0.0;

/// Longest company name, in characters, the index accepts. Also the last
/// length a search ever probes.
pub const MAX_NAME_CHARS: usize = 256;

/// Coarse partition of the autocomplete keyspace: the first character.
pub fn bucket_of(text: &str) -> Option<char> {
    text.chars().next()
}

/// Length in characters, which is what prefix positions are counted in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `len` characters of `text`.
pub fn char_prefix(text: &str, len: usize) -> &str {
    match text.char_indices().nth(len) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone)]
pub struct AutocompleteKeyBuilder {
    namespace: String,
}

impl AutocompleteKeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn partition_key(&self, bucket: char, len: usize) -> String {
        format!("{}:autocomplete:{}:{}", self.namespace, bucket, len)
    }

    pub fn terminal_member(company_name: &str) -> String {
        format!("{}{}", company_name, SUFFIX_MARKER)
    }

    /// Company name carried by a terminal member, `None` for prefix members.
    pub fn strip_terminal(member: &str) -> Option<&str> {
        member.trim().strip_suffix(SUFFIX_MARKER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    ByCompanyName,
    ByTicker,
}

impl LookupKind {
    fn segment(self) -> &'static str {
        match self {
            LookupKind::ByCompanyName => "by_company_name",
            LookupKind::ByTicker => "by_ticker",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LookupKeyBuilder {
    namespace: String,
}

impl LookupKeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Company names keep their case; tickers are upper-cased.
    pub fn key(&self, kind: LookupKind, value: &str) -> String {
        let value = value.trim();
        let value = match kind {
            LookupKind::ByCompanyName => value.to_string(),
            LookupKind::ByTicker => value.to_uppercase(),
        };
        format!("{}:lookup:{}:{}", self.namespace, kind.segment(), value)
    }
}
