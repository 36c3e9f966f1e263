//! Configuration constants.
//!
//! This module defines the defaults and operational limits used by the lookup
//! and refresh machinery.

use std::time::Duration;

/// Namespace prefix for every variable written to a [`crate::VariableSink`].
pub const VAR_PREFIX: &str = "geoip2.";

/// Default update service base URL.
pub const DEFAULT_UPDATE_URL: &str = "https://download.maxmind.com";

/// Default lock file name, placed in the system temp directory.
pub const DEFAULT_LOCK_FILE_NAME: &str = "geoip2.lock";

/// Edition loaded when none is configured.
pub const DEFAULT_EDITION_ID: &str = "GeoLite2-City";

/// File extension of database files on disk.
pub const DATABASE_FILE_EXTENSION: &str = "mmdb";

/// Suffix appended to a database file while a download is staged.
pub const STAGING_SUFFIX: &str = "new";

/// Environment variable holding the MaxMind account ID.
pub const MAXMIND_ACCOUNT_ID_ENV: &str = "MAXMIND_ACCOUNT_ID";

/// Environment variable holding the MaxMind license key.
pub const MAXMIND_LICENSE_KEY_ENV: &str = "MAXMIND_LICENSE_KEY";

// Download limits
/// Maximum accepted download size (300MB). Enterprise editions run large.
pub const MAX_GEOIP_DOWNLOAD_SIZE: usize = 300 * 1024 * 1024;
/// Download timeout; database archives are big and the update service can be slow.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

// Retry strategy for downloads
/// Exponential base of the backoff sequence (delays grow as `base^n * unit`).
pub const RETRY_BACKOFF_BASE: u64 = 2;
/// Multiplier applied to each backoff step, in milliseconds (500ms, 1s, 2s, ...).
pub const RETRY_BACKOFF_UNIT_MS: u64 = 250;
/// Upper bound on a single retry delay.
pub const RETRY_MAX_DELAY_SECS: u64 = 8;
/// Number of retries after the initial attempt.
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// Refresh
/// Age after which an update lock left behind by a crashed run is reclaimed.
pub const LOCK_STALE_AFTER: Duration = Duration::from_secs(60 * 60);
