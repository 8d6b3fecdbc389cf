//! JSON API route configuration.

use crate::api::handlers::{shorten_batch_handler, shorten_handler};
use crate::state::AppState;
use axum::{Router, routing::post};

/// Routes mounted under `/api`.
///
/// # Endpoints
///
/// - `POST /shorten`       - Shorten one URL
/// - `POST /shorten/batch` - Shorten many URLs at once
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/shorten/batch", post(shorten_batch_handler))
}
