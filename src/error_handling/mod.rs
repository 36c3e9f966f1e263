//! Error handling.
//!
//! This module provides the error types for:
//! - Logger initialization
//! - GeoIP database loading, lookup, and refresh
//!
//! Load-time errors are terminal for one database only, never for the whole
//! service. Lookup errors are logged and never returned to request handlers.

mod types;

// Re-export public API
pub use types::{GeoIpError, InitializationError};
