//! Random alias generation.
//!
//! Aliases are drawn uniformly, with replacement, from the 62 ASCII
//! alphanumerics. Uniqueness is not guaranteed here: the repository rejects
//! collisions at insert time and the caller retries with a fresh candidate.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Default alias length.
pub const ALIAS_LENGTH: usize = 6;

/// Generates a random alias of `length` characters from `[A-Za-z0-9]`.
///
/// Uses the thread-local CSPRNG, so concurrent callers never share a seed.
///
/// # Examples
///
/// ```ignore
/// let alias = generate_short(6);
/// assert_eq!(alias.len(), 6);
/// assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_short(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
