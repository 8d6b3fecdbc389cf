//! Repository trait for point access to the URL ⇄ alias mapping.

use super::error::RepositoryResult;
use async_trait::async_trait;

/// Repository interface every storage backend implements.
///
/// Both directions of the mapping are unique: inserting an alias or a URL that
/// is already stored fails without partial effect, it never overwrites.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::InMemoryRepository`] - Lock-guarded maps
/// - [`crate::infrastructure::persistence::PersistedRepository`] - In-memory with JSON snapshot
/// - [`crate::infrastructure::persistence::PgAliasRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Inserts a new mapping into both indices.
    ///
    /// # Errors
    ///
    /// Returns [`super::RepositoryError::ShortAlreadyExists`] if the alias is taken.
    /// Returns [`super::RepositoryError::UrlAlreadyExists`] if the URL is already shortened.
    /// Returns [`super::RepositoryError::Persistence`] if the durable write failed
    /// (the mapping is not kept in that case).
    async fn add(&self, short_url: &str, url: &str) -> RepositoryResult<()>;

    /// Looks up the original URL for an alias.
    ///
    /// # Errors
    ///
    /// Returns [`super::RepositoryError::NotFoundShort`] if the alias is unknown.
    async fn get(&self, short_url: &str) -> RepositoryResult<String>;

    /// Looks up the alias for an original URL (reverse index).
    ///
    /// # Errors
    ///
    /// Returns [`super::RepositoryError::NotFoundUrl`] if the URL has no alias.
    async fn search(&self, url: &str) -> RepositoryResult<String>;
}
