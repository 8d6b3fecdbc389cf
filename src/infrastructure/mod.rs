//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! the concrete storage backends.
//!
//! # Modules
//!
//! - [`persistence`] - In-memory, JSON snapshot and PostgreSQL repositories

pub mod persistence;
