//! DTOs for the shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{BatchItem, BatchResultItem};

/// Body of `POST /api/shorten`.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, message = "url must not be empty"))]
    pub url: String,
}

/// Response of `POST /api/shorten`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    /// Full short link.
    pub result: String,
}

/// One element of the `POST /api/shorten/batch` request array.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchRequestItem {
    #[validate(length(min = 1, message = "correlation_id must not be empty"))]
    pub correlation_id: String,

    #[validate(length(min = 1, message = "original_url must not be empty"))]
    pub original_url: String,
}

impl From<BatchRequestItem> for BatchItem {
    fn from(item: BatchRequestItem) -> Self {
        BatchItem::new(item.correlation_id, item.original_url)
    }
}

/// One element of the `POST /api/shorten/batch` response array.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponseItem {
    pub correlation_id: String,
    pub short_url: String,
}

impl From<BatchResultItem> for BatchResponseItem {
    fn from(item: BatchResultItem) -> Self {
        Self {
            correlation_id: item.correlation_id,
            short_url: item.short_url,
        }
    }
}
