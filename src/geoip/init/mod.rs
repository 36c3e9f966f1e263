//! GeoIP database initialization and loading.
//!
//! This module builds the initial active set from the database files already
//! on disk. Refresh reuses the same loader after new files are installed.

mod loader;

use std::sync::Arc;

use crate::config::GeoIpConfig;
use crate::error_handling::GeoIpError;
use crate::geoip::lookup::GeoIpService;

pub use loader::{load_active_set, LoadOutcome};

/// Validates `config` and returns a service serving whatever databases load.
///
/// Only configuration errors fail here. Editions whose files are missing or
/// unusable are logged and skipped; with none loaded every lookup is a no-op.
pub async fn init_geoip(config: &GeoIpConfig) -> Result<Arc<GeoIpService>, GeoIpError> {
    config.validate()?;

    let outcome = load_active_set(config).await;
    if outcome.set.is_empty() {
        log::warn!(
            "No geoip database loaded from {} (editions: {})",
            config.database_directory.display(),
            config.edition_ids.join(",")
        );
    }
    Ok(Arc::new(GeoIpService::with_active_set(outcome.set)))
}
