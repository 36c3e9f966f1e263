//! Error type definitions.
//!
//! This module defines the error types used throughout the GeoIP lookup and
//! refresh machinery.

use std::net::IpAddr;
use std::path::PathBuf;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Errors raised while loading, querying, or refreshing GeoIP databases.
///
/// None of these reach the request path: lookups log them and leave the
/// affected variables at their defaults.
#[derive(Error, Debug)]
pub enum GeoIpError {
    /// The database declares a type outside the supported schema families.
    #[error("database type {database_type:?} not supported")]
    UnsupportedSchema {
        /// Declared `database_type` from the database metadata.
        database_type: String,
    },

    /// A single record could not be decoded.
    #[error("looking up {edition} record for IP {ip}: {source}")]
    LookupDecode {
        /// Edition the lookup ran against.
        edition: String,
        /// Address that was looked up.
        ip: IpAddr,
        /// Underlying reader error.
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    /// The configured edition has no database file on disk.
    #[error("missing geoip database file for {edition}: {path}")]
    MissingDatabaseFile {
        /// Edition ID whose file is missing.
        edition: String,
        /// Expected file location.
        path: PathBuf,
    },

    /// The file exists but is not a readable MaxMind database.
    #[error("opening geoip database reader {path}: {source}")]
    InvalidDatabase {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    /// Downloading a new database file failed.
    #[error("downloading new database file for {edition}: {reason}")]
    RefreshFetch {
        /// Edition being refreshed.
        edition: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Required configuration is missing or malformed.
    #[error("invalid geoip configuration: {0}")]
    ConfigValidation(String),

    /// Filesystem error on a database, staging, or lock file.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File the operation touched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Another update run holds the lock file.
    #[error("update lock {path} is held by another process")]
    LockHeld {
        /// Lock file location.
        path: PathBuf,
    },
}

impl GeoIpError {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeoIpError::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a fetch failure for `edition`.
    pub(crate) fn fetch(edition: &str, reason: impl std::fmt::Display) -> Self {
        GeoIpError::RefreshFetch {
            edition: edition.to_string(),
            reason: reason.to_string(),
        }
    }
}
