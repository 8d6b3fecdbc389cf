//! Capabilities used by the durable file sidecar.
//!
//! Only the in-memory backend implements them; the persisted wrapper needs all
//! three to export state after a mutation, restore it at startup and undo a
//! mutation whose durable write failed.

use crate::domain::entities::Record;
use async_trait::async_trait;

/// Exports every stored record.
#[async_trait]
pub trait Snapshotter: Send + Sync {
    async fn snapshot(&self) -> Vec<Record>;
}

/// Replaces the whole state with the given records.
#[async_trait]
pub trait Seeder: Send + Sync {
    async fn seed(&self, records: Vec<Record>);
}

/// Compensating delete for a mapping that could not be persisted.
#[async_trait]
pub trait Rollback: Send + Sync {
    async fn remove(&self, short_url: &str, url: &str);
}
