//! In-memory implementation of the repository capabilities.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::entities::{NewRecord, Record};
use crate::domain::repositories::{
    AliasRepository, BatchRepository, RepositoryError, RepositoryResult, Rollback, Seeder,
    Snapshotter,
};

#[derive(Debug, Clone)]
struct Entry {
    id: i64,
    url: String,
}

/// Both directions of the mapping. Always updated together under the write lock.
#[derive(Debug)]
struct Indices {
    by_short: HashMap<String, Entry>,
    by_url: HashMap<String, String>,
    next_id: i64,
}

impl Default for Indices {
    fn default() -> Self {
        Self {
            by_short: HashMap::new(),
            by_url: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Indices {
    fn insert(&mut self, short_url: &str, url: &str) -> Record {
        let id = self.next_id;
        self.next_id += 1;
        self.by_short.insert(
            short_url.to_string(),
            Entry {
                id,
                url: url.to_string(),
            },
        );
        self.by_url.insert(url.to_string(), short_url.to_string());
        Record::new(id, url, short_url)
    }
}

/// Repository holding the mapping in two hash maps behind a single
/// reader/writer lock.
///
/// Readers run concurrently; a writer excludes both readers and other
/// writers, so the two indices are never observed half-updated. Nothing is
/// durable on its own; wrap it in
/// [`crate::infrastructure::persistence::PersistedRepository`] to keep a JSON
/// snapshot on disk.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: RwLock<Indices>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_short.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AliasRepository for InMemoryRepository {
    async fn add(&self, short_url: &str, url: &str) -> RepositoryResult<()> {
        let mut inner = self.inner.write().await;

        if inner.by_short.contains_key(short_url) {
            return Err(RepositoryError::ShortAlreadyExists(short_url.to_string()));
        }
        if inner.by_url.contains_key(url) {
            return Err(RepositoryError::UrlAlreadyExists(url.to_string()));
        }

        inner.insert(short_url, url);
        Ok(())
    }

    async fn get(&self, short_url: &str) -> RepositoryResult<String> {
        self.inner
            .read()
            .await
            .by_short
            .get(short_url)
            .map(|entry| entry.url.clone())
            .ok_or_else(|| RepositoryError::NotFoundShort(short_url.to_string()))
    }

    async fn search(&self, url: &str) -> RepositoryResult<String> {
        self.inner
            .read()
            .await
            .by_url
            .get(url)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFoundUrl(url.to_string()))
    }
}

#[async_trait]
impl BatchRepository for InMemoryRepository {
    async fn get_by_urls(&self, urls: &[String]) -> RepositoryResult<Vec<Record>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.inner.read().await;
        Ok(urls
            .iter()
            .filter_map(|url| {
                let short_url = inner.by_url.get(url)?;
                let id = inner.by_short.get(short_url).map_or(0, |entry| entry.id);
                Some(Record::new(id, url.clone(), short_url.clone()))
            })
            .collect())
    }

    async fn add_many(&self, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut inner = self.inner.write().await;

        // Checked up front so a URL collision aborts the call without partial effect.
        let mut batch_urls = HashSet::with_capacity(records.len());
        for record in &records {
            if inner.by_url.contains_key(&record.url) || !batch_urls.insert(record.url.as_str()) {
                return Err(RepositoryError::UrlAlreadyExists(record.url.clone()));
            }
        }

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            if inner.by_short.contains_key(&record.short_url) {
                continue;
            }
            out.push(inner.insert(&record.short_url, &record.url));
        }

        Ok(out)
    }
}

#[async_trait]
impl Snapshotter for InMemoryRepository {
    async fn snapshot(&self) -> Vec<Record> {
        let inner = self.inner.read().await;
        let mut records: Vec<Record> = inner
            .by_short
            .iter()
            .map(|(short_url, entry)| Record::new(entry.id, entry.url.clone(), short_url.clone()))
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }
}

#[async_trait]
impl Seeder for InMemoryRepository {
    async fn seed(&self, records: Vec<Record>) {
        let mut fresh = Indices::default();
        fresh.next_id = records.iter().map(|r| r.id).max().unwrap_or(0).max(0) + 1;

        for record in records {
            if fresh.by_short.contains_key(&record.short_url)
                || fresh.by_url.contains_key(&record.url)
            {
                warn!(
                    short_url = %record.short_url,
                    url = %record.url,
                    "Skipping duplicate record while seeding"
                );
                continue;
            }

            let id = if record.id > 0 {
                record.id
            } else {
                let id = fresh.next_id;
                fresh.next_id += 1;
                id
            };

            fresh.by_url.insert(record.url.clone(), record.short_url.clone());
            fresh.by_short.insert(
                record.short_url,
                Entry {
                    id,
                    url: record.url,
                },
            );
        }

        *self.inner.write().await = fresh;
    }
}

#[async_trait]
impl Rollback for InMemoryRepository {
    async fn remove(&self, short_url: &str, url: &str) {
        let mut inner = self.inner.write().await;

        // Only drop the pair if it still maps as given, so a rollback never
        // removes someone else's record.
        let matches = inner
            .by_short
            .get(short_url)
            .is_some_and(|entry| entry.url == url);
        if matches {
            inner.by_short.remove(short_url);
            inner.by_url.remove(url);
        }
    }
}
