//! Error taxonomy shared by every repository backend.

use thiserror::Error;

/// Errors returned by repository operations.
///
/// Callers branch on the variant (or on [`RepositoryError::kind`]) rather than on
/// the message: an alias collision is retried with a fresh candidate, while a URL
/// collision means the mapping already exists and must propagate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("short url not found: {0}")]
    NotFoundShort(String),

    #[error("url not found: {0}")]
    NotFoundUrl(String),

    #[error("short url already exists: {0}")]
    ShortAlreadyExists(String),

    #[error("url already exists: {0}")]
    UrlAlreadyExists(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("backend timed out: {0}")]
    Timeout(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Discriminant of [`RepositoryError`] without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    NotFoundShort,
    NotFoundUrl,
    ShortAlreadyExists,
    UrlAlreadyExists,
    Persistence,
    Timeout,
    Backend,
}

impl RepositoryError {
    pub fn kind(&self) -> RepositoryErrorKind {
        match self {
            Self::NotFoundShort(_) => RepositoryErrorKind::NotFoundShort,
            Self::NotFoundUrl(_) => RepositoryErrorKind::NotFoundUrl,
            Self::ShortAlreadyExists(_) => RepositoryErrorKind::ShortAlreadyExists,
            Self::UrlAlreadyExists(_) => RepositoryErrorKind::UrlAlreadyExists,
            Self::Persistence(_) => RepositoryErrorKind::Persistence,
            Self::Timeout(_) => RepositoryErrorKind::Timeout,
            Self::Backend(_) => RepositoryErrorKind::Backend,
        }
    }

    /// Returns true for uniqueness violations on either side of the mapping.
    ///
    /// Single-item shortening treats both as retryable. A URL collision is
    /// normally resolved by looking up the winner's alias; it is only retried
    /// when that record has vanished again (e.g. a rolled-back snapshot write).
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            Self::ShortAlreadyExists(_) | Self::UrlAlreadyExists(_)
        )
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
