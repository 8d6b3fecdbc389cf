//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /`                   - Shorten a URL sent as plain text
//! - `GET  {base}/{alias}`      - Redirect to the original URL
//! - `GET  /ping`               - Database liveness
//! - `/api/*`                   - JSON API
//!
//! `{base}` is the path of the configured base URL, empty by default.
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **gzip** - Request decompression and response compression
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{ping_handler, redirect_handler, shorten_text_handler};
use crate::api::middleware::{compression, tracing};
use crate::state::AppState;
use crate::utils::link::base_path;
use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and middleware without path normalization.
///
/// The redirect route is mounted under the path of the shortener's base URL
/// so composed links resolve back to this service.
pub fn router(state: AppState) -> Router {
    let redirect_path = match base_path(state.shortener.base_url()).as_str() {
        "/" => "/{alias}".to_string(),
        prefix => format!("{prefix}/{{alias}}"),
    };

    Router::new()
        .route("/", post(shorten_text_handler))
        .route("/ping", get(ping_handler))
        .route(&redirect_path, get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .with_state(state)
        .layer(compression::request_layer())
        .layer(compression::response_layer())
        .layer(tracing::layer())
}
