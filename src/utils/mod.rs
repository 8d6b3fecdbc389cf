//! Utility functions shared across layers.
//!
//! - [`alias_generator`] - Random alias generation
//! - [`link`] - URL validation and short link composition

pub mod alias_generator;
pub mod link;
