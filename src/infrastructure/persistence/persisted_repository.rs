//! In-memory repository with a durable JSON snapshot.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::json_store::Persister;
use crate::domain::entities::{NewRecord, Record};
use crate::domain::repositories::{
    AliasRepository, BatchRepository, RepositoryResult, Rollback, Seeder, Snapshotter,
};

/// Wraps a store (normally
/// [`InMemoryRepository`](super::InMemoryRepository)) and writes a full
/// snapshot after every successful mutation.
///
/// The store is driven only through its [`Snapshotter`], [`Seeder`] and
/// [`Rollback`] capabilities besides the repository traits themselves.
///
/// Mutations are serialized by `write_lock` so the snapshot on disk always
/// matches the memory state at the moment it was written. If the snapshot
/// cannot be written, the mutation is rolled back and a
/// [`RepositoryError::Persistence`](crate::domain::repositories::RepositoryError::Persistence)
/// is returned. Reads go straight to memory.
pub struct PersistedRepository<S> {
    inner: Arc<S>,
    persister: Arc<dyn Persister>,
    write_lock: Mutex<()>,
}

impl<S> PersistedRepository<S>
where
    S: Snapshotter + Seeder + Rollback,
{
    /// Loads the last snapshot into `inner` and returns the wrapper.
    ///
    /// # Errors
    ///
    /// Returns the persister's error if an existing snapshot cannot be read.
    pub async fn new(
        inner: Arc<S>,
        persister: Arc<dyn Persister>,
    ) -> RepositoryResult<Self> {
        let records = persister.load().await?;
        let count = records.len();
        inner.seed(records).await;
        info!(records = count, "Restored snapshot");

        Ok(Self {
            inner,
            persister,
            write_lock: Mutex::new(()),
        })
    }

    async fn save(&self) -> RepositoryResult<()> {
        let snapshot = self.inner.snapshot().await;
        self.persister.save(&snapshot).await
    }
}

#[async_trait]
impl<S> AliasRepository for PersistedRepository<S>
where
    S: AliasRepository + Snapshotter + Seeder + Rollback,
{
    async fn add(&self, short_url: &str, url: &str) -> RepositoryResult<()> {
        let _guard = self.write_lock.lock().await;

        self.inner.add(short_url, url).await?;

        if let Err(e) = self.save().await {
            error!(error = %e, short_url, "Snapshot write failed, rolling back insert");
            self.inner.remove(short_url, url).await;
            return Err(e);
        }

        Ok(())
    }

    async fn get(&self, short_url: &str) -> RepositoryResult<String> {
        self.inner.get(short_url).await
    }

    async fn search(&self, url: &str) -> RepositoryResult<String> {
        self.inner.search(url).await
    }
}

#[async_trait]
impl<S> BatchRepository for PersistedRepository<S>
where
    S: BatchRepository + Snapshotter + Seeder + Rollback,
{
    async fn get_by_urls(&self, urls: &[String]) -> RepositoryResult<Vec<Record>> {
        self.inner.get_by_urls(urls).await
    }

    async fn add_many(&self, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>> {
        let _guard = self.write_lock.lock().await;

        let inserted = self.inner.add_many(records).await?;
        if inserted.is_empty() {
            return Ok(inserted);
        }

        if let Err(e) = self.save().await {
            error!(error = %e, count = inserted.len(), "Snapshot write failed, rolling back batch");
            for record in &inserted {
                self.inner.remove(&record.short_url, &record.url).await;
            }
            return Err(e);
        }

        Ok(inserted)
    }
}
