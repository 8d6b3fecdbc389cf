//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects an alias to its original URL.
///
/// # Endpoint
///
/// `GET /{alias}` (under the base URL's path)
///
/// # Errors
///
/// Returns 404 Not Found if the alias is unknown.
pub async fn redirect_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let url = state.shortener.resolve(&alias).await?;
    debug!(%alias, %url, "Redirecting");

    Ok(Redirect::temporary(&url))
}
