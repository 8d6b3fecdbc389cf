//! Application layer services implementing business logic.
//!
//! Services consume repository capability traits and provide a storage-agnostic
//! API for HTTP handlers.
//!
//! - [`services::ShortenerService`] - Single and batch shortening, alias resolution
//! - [`error::ShortenerError`] - Service-level error taxonomy

pub mod error;
pub mod services;

pub use error::ShortenerError;
