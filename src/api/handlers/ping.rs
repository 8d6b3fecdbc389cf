//! Handler for the storage liveness check.

use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::state::AppState;

/// Reports whether the database is reachable.
///
/// # Endpoint
///
/// `GET /ping`
///
/// # Response Codes
///
/// - **200 OK**: Database answered within the ping deadline
/// - **500 Internal Server Error**: Ping failed, or no database is configured
pub async fn ping_handler(State(state): State<AppState>) -> StatusCode {
    let Some(pinger) = &state.pinger else {
        return StatusCode::INTERNAL_SERVER_ERROR;
    };

    match pinger.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
