//! geoip2_vars library: MaxMind GeoIP2/GeoLite2 lookups as flat request variables
//!
//! This library resolves a client IP address against one or more MaxMind
//! databases and writes the results as `geoip2.*` variables into a
//! [`VariableSink`]. Databases of any supported schema family (Enterprise/City/
//! Country, ISP/ASN, connection type, domain, anonymous IP) can be combined;
//! later databases win on shared keys. A background [`RefreshManager`] can
//! download new database files and swap them in without blocking lookups.
//!
//! # Example
//!
//! ```no_run
//! use geoip2_vars::{init_geoip, GeoIpConfig, VariableSink};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeoIpConfig {
//!     database_directory: PathBuf::from("/var/lib/GeoIP"),
//!     edition_ids: vec!["GeoLite2-City".into(), "GeoLite2-ASN".into()],
//!     ..Default::default()
//! };
//!
//! let service = init_geoip(&config).await?;
//! let mut sink = VariableSink::new();
//! service.resolve(Some("81.2.69.160".parse()?), &mut sink);
//! println!("{:?}", sink.get_str("country_code"));
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! Loading and refresh require a Tokio runtime. Lookups are synchronous and
//! may be called from any thread.

#![warn(missing_docs)]

mod app;
pub mod config;
mod error_handling;
pub mod geoip;
pub mod initialization;
pub mod refresh;
mod variables;

// Re-export public API
pub use app::shutdown_gracefully;
pub use config::{GeoIpConfig, LogFormat, LogLevel, Opt, OutputFormat};
pub use error_handling::{GeoIpError, InitializationError};
pub use geoip::{
    init_geoip, load_active_set, prime_defaults, ActiveSet, GeoDatabase, GeoIpMetadata,
    GeoIpService, Resolver, SchemaFamily,
};
pub use refresh::{
    Fetcher, HttpFetcher, RefreshHandle, RefreshManager, RefreshReport, RefreshState,
    StateListener, UpdateLock,
};
pub use variables::{VarValue, VariableSink};
