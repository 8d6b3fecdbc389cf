//! JSON snapshot file.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::entities::Record;
use crate::domain::repositories::{RepositoryError, RepositoryResult};

/// Durable storage for a full snapshot of the mapping.
#[async_trait]
pub trait Persister: Send + Sync {
    /// Reads the last saved snapshot. An absent store yields an empty list.
    async fn load(&self) -> RepositoryResult<Vec<Record>>;

    /// Replaces the stored snapshot with `records`.
    async fn save(&self, records: &[Record]) -> RepositoryResult<()>;
}

/// Snapshot kept as a pretty-printed JSON array of records.
///
/// Writes go to `<path>.tmp` first and are renamed over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn persistence_error(action: &str, path: &Path, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Persistence(format!("{action} {}: {err}", path.display()))
}

#[async_trait]
impl Persister for JsonFileStore {
    async fn load(&self) -> RepositoryResult<Vec<Record>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Snapshot file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(persistence_error("read", &self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| persistence_error("decode", &self.path, e))
    }

    async fn save(&self, records: &[Record]) -> RepositoryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence_error("create directory for", &self.path, e))?;
        }

        let body = serde_json::to_vec_pretty(records)
            .map_err(|e| persistence_error("encode", &self.path, e))?;

        let tmp = self.tmp_path();
        let written = match fs::write(&tmp, body).await {
            Ok(()) => fs::rename(&tmp, &self.path)
                .await
                .map_err(|e| persistence_error("rename", &tmp, e)),
            Err(e) => Err(persistence_error("write", &tmp, e)),
        };

        if written.is_err() {
            discard_tmp(&tmp).await;
        }
        written
    }
}

/// Best-effort removal of a leftover temporary file.
async fn discard_tmp(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await
        && e.kind() != ErrorKind::NotFound
    {
        warn!(path = %tmp.display(), error = %e, "Failed to remove temporary snapshot");
    }
}
