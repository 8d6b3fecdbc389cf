//! Service-level error taxonomy.

use crate::domain::repositories::RepositoryError;
use crate::utils::link::UrlError;
use thiserror::Error;

/// Outcomes of the shortener service that are not a success.
///
/// The HTTP layer maps these to status codes and never looks past them into
/// the repository error that may be wrapped in [`ShortenerError::Repository`].
#[derive(Debug, Error)]
pub enum ShortenerError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: UrlError },

    #[error("short url not found: {0}")]
    NotFound(String),

    #[error("url appears more than once in the batch: {0}")]
    DuplicateInBatch(String),

    #[error("could not generate a unique short url after {attempts} attempts ({remaining} unresolved)")]
    GenerationExhausted { attempts: usize, remaining: usize },

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("storage backend does not support batch operations")]
    BatchUnsupported,

    #[error("cannot compose short link: {0}")]
    Link(#[source] UrlError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ShortenerError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFoundShort(short_url) => Self::NotFound(short_url),
            RepositoryError::Persistence(message) => Self::Persistence(message),
            other => Self::Repository(other),
        }
    }
}
