//! Configuration types and CLI options.
//!
//! This module defines the library configuration consumed by the lookup and
//! refresh machinery, plus the command-line options that build it.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DATABASE_FILE_EXTENSION, DEFAULT_EDITION_ID, DEFAULT_LOCK_FILE_NAME, DEFAULT_UPDATE_URL,
    MAXMIND_ACCOUNT_ID_ENV, MAXMIND_LICENSE_KEY_ENV, STAGING_SUFFIX,
};
use crate::error_handling::GeoIpError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the CLI prints resolved variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `key = value` line per variable
    Plain,
    /// One JSON object per address
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use geoip2_vars::GeoIpConfig;
/// use std::path::PathBuf;
///
/// let config = GeoIpConfig {
///     database_directory: PathBuf::from("/var/lib/GeoIP"),
///     edition_ids: vec!["GeoLite2-City".into(), "GeoLite2-ASN".into()],
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GeoIpConfig {
    /// MaxMind account ID (0 = not configured)
    pub account_id: u32,

    /// Case-sensitive MaxMind license key
    pub license_key: String,

    /// Directory holding `<edition>.mmdb` files
    pub database_directory: PathBuf,

    /// Lock file guarding concurrent update runs
    pub lock_file: PathBuf,

    /// Editions to load, in activation order
    pub edition_ids: Vec<String>,

    /// Update service base URL
    pub update_url: String,

    /// Seconds between refreshes (0 = refresh once at startup)
    pub update_frequency_secs: u64,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        let temp_dir = std::env::temp_dir();
        Self {
            account_id: 0,
            license_key: String::new(),
            lock_file: temp_dir.join(DEFAULT_LOCK_FILE_NAME),
            database_directory: temp_dir,
            edition_ids: vec![DEFAULT_EDITION_ID.to_string()],
            update_url: DEFAULT_UPDATE_URL.to_string(),
            update_frequency_secs: 0,
        }
    }
}

impl GeoIpConfig {
    /// Checks that a database directory and at least one edition are configured.
    ///
    /// Must pass before any database is loaded or served.
    pub fn validate(&self) -> Result<(), GeoIpError> {
        if self.database_directory.as_os_str().is_empty() || self.edition_ids.is_empty() {
            return Err(GeoIpError::ConfigValidation(format!(
                "missing: database directory {:?} or edition IDs {:?}",
                self.database_directory, self.edition_ids
            )));
        }
        if let Some(blank) = self.edition_ids.iter().find(|e| e.trim().is_empty()) {
            return Err(GeoIpError::ConfigValidation(format!(
                "blank edition ID {:?}",
                blank
            )));
        }
        Ok(())
    }

    /// Whether credentials for the update service are present.
    pub fn has_credentials(&self) -> bool {
        self.account_id > 0 && !self.license_key.is_empty()
    }

    /// Live database file for `edition`.
    pub fn database_path(&self, edition: &str) -> PathBuf {
        self.database_directory
            .join(format!("{}.{}", edition, DATABASE_FILE_EXTENSION))
    }

    /// Staging file a download for `edition` is written to before it goes live.
    pub fn staging_path(&self, edition: &str) -> PathBuf {
        self.database_directory.join(format!(
            "{}.{}.{}",
            edition, DATABASE_FILE_EXTENSION, STAGING_SUFFIX
        ))
    }
}

/// Splits a comma-separated edition list, trimming entries and dropping empties.
pub fn parse_edition_ids<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Command-line options for the `geoip2_vars` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "geoip2_vars",
    about = "Resolve IP addresses to geoip2.* variables using MaxMind databases"
)]
pub struct Opt {
    /// IP addresses to resolve (read from stdin, one per line, when omitted)
    pub ips: Vec<IpAddr>,

    /// MaxMind account ID
    #[arg(long, env = MAXMIND_ACCOUNT_ID_ENV, default_value_t = 0)]
    pub account_id: u32,

    /// MaxMind license key
    #[arg(long, env = MAXMIND_LICENSE_KEY_ENV, default_value = "", hide_env_values = true)]
    pub license_key: String,

    /// Directory holding <edition>.mmdb files (defaults to the system temp directory)
    #[arg(long)]
    pub database_directory: Option<PathBuf>,

    /// Lock file preventing concurrent update runs
    #[arg(long)]
    pub lock_file: Option<PathBuf>,

    /// Database edition IDs to load, comma-separated (e.g. GeoLite2-City,GeoLite2-ASN)
    #[arg(long = "edition-id")]
    pub edition_ids: Vec<String>,

    /// Update service base URL
    #[arg(long, default_value = DEFAULT_UPDATE_URL)]
    pub update_url: String,

    /// Seconds between database refreshes (0 = refresh once at startup)
    #[arg(long, default_value_t = 0)]
    pub update_frequency: u64,

    /// Keep running and refreshing databases until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Output format for resolved variables
    #[arg(long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Opt {
    /// Builds the library configuration, filling unset options with defaults.
    pub fn to_config(&self) -> GeoIpConfig {
        let defaults = GeoIpConfig::default();
        let edition_ids = parse_edition_ids(&self.edition_ids);
        GeoIpConfig {
            account_id: self.account_id,
            license_key: self.license_key.clone(),
            database_directory: self
                .database_directory
                .clone()
                .unwrap_or(defaults.database_directory),
            lock_file: self.lock_file.clone().unwrap_or(defaults.lock_file),
            edition_ids: if edition_ids.is_empty() {
                defaults.edition_ids
            } else {
                edition_ids
            },
            update_url: self.update_url.clone(),
            update_frequency_secs: self.update_frequency,
        }
    }
}
