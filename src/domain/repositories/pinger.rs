//! Storage liveness probe.

use super::error::RepositoryResult;
use async_trait::async_trait;

/// Backends that can report whether their storage is reachable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Succeeds when the storage answered within the backend's ping deadline.
    async fn ping(&self) -> RepositoryResult<()>;
}
