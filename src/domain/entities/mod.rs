//! Core domain entities.
//!
//! - [`Record`] - A stored URL ⇄ alias mapping
//! - [`NewRecord`] - Candidate mapping submitted to a batch insert

pub mod record;

pub use record::{NewRecord, Record};
