//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, download limits, retry policy)
//! - The library configuration (`GeoIpConfig`)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{parse_edition_ids, GeoIpConfig, LogFormat, LogLevel, Opt, OutputFormat};
