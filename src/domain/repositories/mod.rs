//! Repository trait definitions for the domain layer.
//!
//! The storage contract is split into independently checkable capabilities:
//!
//! - [`AliasRepository`] - Point insert and lookups, implemented by every backend
//! - [`BatchRepository`] - Multi-item lookup and insert
//! - [`TxRunner`] / [`BatchTransaction`] - Atomic scope for batch operations
//! - [`Snapshotter`], [`Seeder`], [`Rollback`] - Hooks for the JSON snapshot sidecar
//! - [`Pinger`] - Storage liveness probe
//!
//! Implementations live in `crate::infrastructure::persistence`. Mock
//! implementations are generated via `mockall` for testing.

pub mod alias_repository;
pub mod batch_repository;
pub mod error;
pub mod pinger;
pub mod snapshot;

pub use alias_repository::AliasRepository;
pub use batch_repository::{BatchRepository, BatchTransaction, TxRunner};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryResult};
pub use pinger::Pinger;
pub use snapshot::{Rollback, Seeder, Snapshotter};

#[cfg(test)]
pub use alias_repository::MockAliasRepository;
#[cfg(test)]
pub use batch_repository::{MockBatchRepository, MockTxRunner};
