//! HTTP server initialization and runtime setup.
//!
//! Selects the storage backend, builds the shortener service and runs the
//! Axum server.

use crate::application::services::ShortenerService;
use crate::config::Config;
use crate::domain::repositories::Pinger;
use crate::infrastructure::persistence::{
    InMemoryRepository, JsonFileStore, PersistedRepository, PgAliasRepository, run_migrations,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds handler state for the configured backend.
///
/// # Backends
///
/// - `database_dsn` set: PostgreSQL, migrations applied, transactional batches
/// - `file_storage_path` set: in-memory, restored from and written to the snapshot
/// - neither: in-memory only
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail or the
/// snapshot file cannot be read.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let base_url = config.parsed_base_url()?;

    if let Some(dsn) = &config.database_dsn {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        info!("Connected to database");

        run_migrations(&pool)
            .await
            .context("Failed to migrate")?;

        let repository = Arc::new(PgAliasRepository::new(Arc::new(pool)));
        let shortener = ShortenerService::new(repository.clone(), base_url)
            .with_batch(repository.clone())
            .with_transactions(repository.clone());
        let pinger: Arc<dyn Pinger> = repository;

        return Ok(AppState::new(Arc::new(shortener), Some(pinger)));
    }

    let memory = Arc::new(InMemoryRepository::new());

    let shortener = match &config.file_storage_path {
        Some(path) => {
            let persisted = Arc::new(
                PersistedRepository::new(memory, Arc::new(JsonFileStore::new(path)))
                    .await
                    .with_context(|| format!("Failed to load snapshot {}", path.display()))?,
            );
            info!(path = %path.display(), "Using in-memory storage with JSON snapshot");
            ShortenerService::new(persisted.clone(), base_url).with_batch(persisted)
        }
        None => {
            info!("Using in-memory storage without persistence");
            ShortenerService::new(memory.clone(), base_url).with_batch(memory)
        }
    };

    Ok(AppState::new(Arc::new(shortener), None))
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Storage initialization fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_address))?;
    info!("Listening on http://{}", config.server_address);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
