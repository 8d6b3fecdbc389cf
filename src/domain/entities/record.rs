//! Record entity representing a stored URL ⇄ alias mapping.

use serde::{Deserialize, Serialize};

/// A stored mapping between an original URL and its short alias.
///
/// The mapping is a bijection: a URL has at most one alias and an alias points
/// to exactly one URL. Records are never mutated in place.
///
/// `id` orders records for snapshot export. Snapshot files written before ids
/// existed deserialize with `id = 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: i64,
    pub url: String,
    pub short_url: String,
}

impl Record {
    /// Creates a new Record instance.
    pub fn new(id: i64, url: impl Into<String>, short_url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            short_url: short_url.into(),
        }
    }
}

/// Input data for inserting a record through a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub url: String,
    pub short_url: String,
}

impl NewRecord {
    pub fn new(url: impl Into<String>, short_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            short_url: short_url.into(),
        }
    }
}
