//! GeoIP data structures.
//!
//! This module defines the metadata reported for each active database.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata about a loaded GeoIP database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoIpMetadata {
    /// Edition ID the database was configured under
    pub edition: String,
    /// Schema family tag (`enterprise`, `isp`, ...)
    pub family: String,
    /// `database_type` declared by the database itself
    pub database_type: String,
    /// Database build date/version (extracted from database)
    pub version: String,
    /// File the database was loaded from
    pub path: PathBuf,
}
