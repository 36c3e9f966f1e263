//! Graceful shutdown handling.

use std::sync::Arc;

use crate::geoip::GeoIpService;
use crate::refresh::RefreshHandle;

/// Stops the refresh task, then releases every database reader.
///
/// The refresh task is awaited first so it cannot install a new set after the
/// service has been closed.
pub async fn shutdown_gracefully(refresh: Option<RefreshHandle>, service: Arc<GeoIpService>) {
    if let Some(refresh) = refresh {
        refresh.shutdown().await;
    }
    service.close();
    log::debug!("GeoIP service shut down");
}
