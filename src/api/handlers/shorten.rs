//! Handlers for the shortening endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{
    BatchRequestItem, BatchResponseItem, ShortenRequest, ShortenResponse,
};
use crate::application::services::BatchItem;
use crate::error::AppError;
use crate::state::AppState;

fn created_or_conflict(existed: bool) -> StatusCode {
    if existed {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

/// Shortens a URL sent as the raw request body.
///
/// # Endpoint
///
/// `POST /`
///
/// Surrounding whitespace is trimmed. The response body is the full short link
/// as `text/plain`.
///
/// # Response Codes
///
/// - **201 Created**: New alias created
/// - **409 Conflict**: URL was already shortened; body carries the existing link
/// - **400 Bad Request**: Empty or invalid URL
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, AppError> {
    let url = body.trim();
    if url.is_empty() {
        return Err(AppError::bad_request("Request body must contain a URL", json!({})));
    }

    let result = state.shortener.shorten(url).await?;

    Ok((
        created_or_conflict(result.existed),
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        result.link,
    )
        .into_response())
}

/// Shortens a URL sent as JSON.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com" }
/// ```
///
/// # Response
///
/// ```json
/// { "result": "http://localhost:8080/aB3xQ9" }
/// ```
///
/// 201 for a new alias, 409 if the URL was already shortened.
///
/// # Errors
///
/// Returns 400 Bad Request for malformed JSON or an invalid URL.
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let result = state.shortener.shorten(&payload.url).await?;

    Ok((
        created_or_conflict(result.existed),
        Json(ShortenResponse {
            result: result.link,
        }),
    ))
}

/// Shortens many URLs in one request.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [
///   { "correlation_id": "1", "original_url": "https://a.example" },
///   { "correlation_id": "2", "original_url": "https://b.example" }
/// ]
/// ```
///
/// # Response
///
/// ```json
/// [
///   { "correlation_id": "1", "short_url": "http://localhost:8080/aB3xQ9" },
///   { "correlation_id": "2", "short_url": "http://localhost:8080/Zx81Qp" }
/// ]
/// ```
///
/// Items come back in request order. 201 if every URL was new, 409 if at least
/// one already had an alias.
///
/// # Errors
///
/// Returns 400 Bad Request for an empty array, a missing field, an invalid URL
/// or a URL repeated within the request; nothing is stored in that case.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    payload: Result<Json<Vec<BatchRequestItem>>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<BatchResponseItem>>), AppError> {
    let Json(payload) = payload?;

    if payload.is_empty() {
        return Err(AppError::bad_request("Batch must not be empty", json!({})));
    }

    let mut items = Vec::with_capacity(payload.len());
    for item in payload {
        item.validate()?;
        items.push(BatchItem::from(item));
    }

    let outcome = state.shortener.batch(items).await?;

    Ok((
        created_or_conflict(outcome.had_existing),
        Json(outcome.items.into_iter().map(Into::into).collect()),
    ))
}
