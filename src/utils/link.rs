//! URL validation and short link composition.

use url::Url;

/// Errors produced while validating or composing URLs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL must include a host")]
    MissingHost,

    #[error("Base URL cannot carry a path: {0}")]
    CannotBeABase(String),
}

/// Checks that `raw` is a non-empty, absolute URL with a host.
///
/// The input is not normalized: the stored mapping keeps the exact string the
/// client sent, so re-shortening the same text finds the same record.
///
/// # Errors
///
/// Returns [`UrlError::Empty`] for an empty string, [`UrlError::InvalidFormat`]
/// when the parser rejects it and [`UrlError::MissingHost`] for host-less URLs
/// such as `mailto:`.
pub fn validate_url(raw: &str) -> Result<(), UrlError> {
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(raw).map_err(|e| UrlError::InvalidFormat(e.to_string()))?;

    if !url.has_host() {
        return Err(UrlError::MissingHost);
    }

    Ok(())
}

/// Joins the base URL with an alias path segment.
///
/// `http://localhost:8080/` + `aB3xQ9` gives `http://localhost:8080/aB3xQ9`;
/// a base with a path keeps it (`http://h:1/s/` + `x` gives `http://h:1/s/x`).
///
/// # Errors
///
/// Returns [`UrlError::CannotBeABase`] if the base URL cannot have path segments.
pub fn create_link(base: &Url, short_url: &str) -> Result<String, UrlError> {
    let mut link = base.clone();
    link.path_segments_mut()
        .map_err(|_| UrlError::CannotBeABase(base.to_string()))?
        .pop_if_empty()
        .push(short_url);

    Ok(link.into())
}

/// Path prefix under which aliases are served, always starting with `/`.
pub fn base_path(base: &Url) -> String {
    let path = base.path().trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
