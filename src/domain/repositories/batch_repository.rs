//! Batch and transactional capabilities.
//!
//! These are separate from [`super::AliasRepository`] so a backend only
//! implements what it can actually guarantee. The shortener service checks for
//! a [`TxRunner`] at construction time and falls back to running the batch
//! directly against a [`BatchRepository`] when none is available.

use super::error::RepositoryResult;
use crate::domain::entities::{NewRecord, Record};
use async_trait::async_trait;

/// Multi-item lookup and insert.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Returns the records whose URL is in `urls`.
    ///
    /// URLs without a mapping are simply absent from the result. Order is not
    /// significant.
    async fn get_by_urls(&self, urls: &[String]) -> RepositoryResult<Vec<Record>>;

    /// Inserts the candidates and returns the records actually inserted.
    ///
    /// A candidate whose alias is already taken is skipped silently; the caller
    /// retries it with a new alias.
    ///
    /// # Errors
    ///
    /// Returns [`super::RepositoryError::UrlAlreadyExists`] and aborts the whole
    /// call if any candidate URL is already stored or appears twice in
    /// `records`.
    async fn add_many(&self, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>>;
}

/// Batch operations running inside an open transaction.
///
/// Dropping the transaction without calling [`BatchTransaction::commit`] rolls
/// back every insert made through it.
#[async_trait]
pub trait BatchTransaction: BatchRepository {
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;
}

/// Backends able to scope a batch in an atomic transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TxRunner: Send + Sync {
    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the transaction cannot be started.
    async fn begin(&self) -> RepositoryResult<Box<dyn BatchTransaction>>;
}
