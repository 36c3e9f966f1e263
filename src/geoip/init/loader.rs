//! GeoIP database loading from the configured directory.

use crate::config::GeoIpConfig;
use crate::error_handling::GeoIpError;
use crate::geoip::database::{GeoDatabase, Resolver};
use crate::geoip::lookup::ActiveSet;

/// Result of loading every configured edition from disk.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Databases that opened and classified, in configured order.
    pub set: ActiveSet,
    /// Why each remaining edition was left out.
    pub skipped: Vec<GeoIpError>,
}

/// Opens `<directory>/<edition>.mmdb` for every configured edition.
///
/// A missing, unreadable, or unsupported file excludes that edition only; the
/// others still load.
pub async fn load_active_set(config: &GeoIpConfig) -> LoadOutcome {
    log::debug!("load geoip readers");
    let mut outcome = LoadOutcome::default();

    for edition in &config.edition_ids {
        let path = config.database_path(edition);
        match GeoDatabase::open(&path, edition).await {
            Ok(database) => {
                log::info!(
                    "initialized geoip database reader {} ({}, {})",
                    edition,
                    database.family(),
                    path.display()
                );
                outcome.set.push(Box::new(database));
            }
            Err(e) => {
                match &e {
                    GeoIpError::MissingDatabaseFile { .. } => log::warn!("{}", e),
                    _ => log::error!("initializing geoip database reader {}: {}", edition, e),
                }
                outcome.skipped.push(e);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, editions: &[&str]) -> GeoIpConfig {
        GeoIpConfig {
            database_directory: dir.path().to_path_buf(),
            edition_ids: editions.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_files_are_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_in(&temp_dir, &["GeoLite2-City", "GeoLite2-ASN"]);

        let outcome = load_active_set(&config).await;
        assert!(outcome.set.is_empty());
        assert_eq!(outcome.skipped.len(), 2);
        assert!(outcome
            .skipped
            .iter()
            .all(|e| matches!(e, GeoIpError::MissingDatabaseFile { .. })));
    }

    #[tokio::test]
    async fn test_invalid_file_does_not_block_others() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        tokio::fs::write(temp_dir.path().join("GeoLite2-City.mmdb"), b"garbage")
            .await
            .expect("Failed to write test data");
        let config = config_in(&temp_dir, &["GeoLite2-City", "GeoLite2-ASN"]);

        let outcome = load_active_set(&config).await;
        assert!(outcome.set.is_empty());
        assert!(matches!(
            outcome.skipped[0],
            GeoIpError::InvalidDatabase { .. }
        ));
        assert!(matches!(
            outcome.skipped[1],
            GeoIpError::MissingDatabaseFile { .. }
        ));
    }
}
