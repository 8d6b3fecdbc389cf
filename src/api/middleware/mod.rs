//! HTTP middleware for request processing.
//!
//! Provides request tracing and gzip content coding.

pub mod compression;
pub mod tracing;
