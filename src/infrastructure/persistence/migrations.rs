//! Schema migrations for the PostgreSQL backend.

use sqlx::PgPool;
use sqlx::migrate::MigrateError;
use tracing::info;

/// SQLSTATE raised when the connected role may not create objects.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Applies the embedded migrations.
///
/// A role without DDL privileges is expected in some deployments where the
/// schema is managed externally; in that case the migrations are skipped with
/// a warning and startup continues.
///
/// # Errors
///
/// Returns any other migration failure.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations applied");
            Ok(())
        }
        Err(e) if is_insufficient_privilege(&e) => {
            info!(error = %e, "Insufficient privileges to migrate, assuming schema is managed externally");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn is_insufficient_privilege(e: &MigrateError) -> bool {
    let sqlx_err = match e {
        MigrateError::Execute(err) | MigrateError::ExecuteMigration(err, _) => err,
        _ => return false,
    };
    sqlx_err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == INSUFFICIENT_PRIVILEGE)
}
