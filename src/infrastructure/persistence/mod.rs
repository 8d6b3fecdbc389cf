//! Storage backends.
//!
//! Every backend implements the domain repository traits; which capabilities
//! it provides decides what the shortener service can do with it.
//!
//! # Backends
//!
//! - [`InMemoryRepository`] - Two hash maps behind a reader/writer lock
//! - [`PersistedRepository`] - In-memory state plus a JSON snapshot written by a [`Persister`]
//! - [`PgAliasRepository`] - PostgreSQL with transactional batches

pub mod json_store;
pub mod memory_repository;
pub mod migrations;
pub mod persisted_repository;
pub mod pg_alias_repository;

pub use json_store::{JsonFileStore, Persister};
pub use memory_repository::InMemoryRepository;
pub use migrations::run_migrations;
pub use persisted_repository::PersistedRepository;
pub use pg_alias_repository::{PgAliasRepository, PgBatchTransaction};
