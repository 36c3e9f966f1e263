//! Refresh cycles end to end: download, stage, verify, swap.

mod helpers;

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;
use futures::future::BoxFuture;
use httptest::{matchers::*, responders::*, Expectation, Server};
use tempfile::TempDir;

use geoip2_vars::{
    Fetcher, GeoIpConfig, GeoIpError, GeoIpService, HttpFetcher, RefreshManager, RefreshState,
    VariableSink,
};
use helpers::{fixture_path, ip};

const DOMAIN_FIXTURE: &str = "GeoIP2-Domain-Test.mmdb";

/// Serves canned bytes per edition; unknown editions fail.
#[derive(Default)]
struct ScriptedFetcher {
    files: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl Fetcher for ScriptedFetcher {
    fn fetch<'a>(&'a self, edition: &'a str) -> BoxFuture<'a, Result<Vec<u8>, GeoIpError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.files.get(edition).cloned().ok_or_else(|| GeoIpError::RefreshFetch {
            edition: edition.to_string(),
            reason: "404 Not Found".to_string(),
        });
        Box::pin(async move { result })
    }
}

fn config_in(dir: &TempDir, editions: &[&str]) -> GeoIpConfig {
    GeoIpConfig {
        account_id: 42,
        license_key: "secret".to_string(),
        database_directory: dir.path().to_path_buf(),
        lock_file: dir.path().join("geoip2.lock"),
        edition_ids: editions.iter().map(|e| e.to_string()).collect(),
        ..Default::default()
    }
}

fn read_fixture(file_name: &str) -> Vec<u8> {
    let path = fixture_path(file_name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
}

fn tar_gz(entry_name: &str, contents: &[u8]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, entry_name, contents)
        .expect("append tar entry");
    let mut encoder = builder.into_inner().expect("finish tar");
    encoder.flush().expect("flush gzip");
    encoder.finish().expect("finish gzip")
}

#[tokio::test]
async fn test_failed_cycle_keeps_serving_previous_set() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = config_in(&temp_dir, &["GeoIP2-Domain", "GeoLite2-ASN"]);
    let service = Arc::new(GeoIpService::new());
    let fetcher = Arc::new(ScriptedFetcher::default());

    let manager = RefreshManager::new(config.clone(), Arc::clone(&service), fetcher.clone());
    let report = manager.refresh_once().await.expect("lock should be free");

    assert!(report.updated.is_empty());
    let failed: Vec<&str> = report.failed.iter().map(|(e, _)| e.as_str()).collect();
    assert_eq!(failed, vec!["GeoIP2-Domain", "GeoLite2-ASN"]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(manager.state(), RefreshState::Idle);
    assert!(!config.lock_file.exists());
    assert!(!service.is_enabled());
}

#[tokio::test]
async fn test_successful_cycle_swaps_in_new_database() {
    let bytes = read_fixture(DOMAIN_FIXTURE);
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = config_in(&temp_dir, &["GeoIP2-Domain", "GeoLite2-ASN"]);
    let service = Arc::new(GeoIpService::new());
    let mut fetcher = ScriptedFetcher::default();
    fetcher.files.insert("GeoIP2-Domain".to_string(), bytes);

    let manager = RefreshManager::new(config.clone(), Arc::clone(&service), Arc::new(fetcher));
    let report = manager.refresh_once().await.expect("lock should be free");

    assert_eq!(report.updated, vec!["GeoIP2-Domain".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert!(config.database_path("GeoIP2-Domain").exists());
    assert!(!config.staging_path("GeoIP2-Domain").exists());

    let editions: Vec<String> = service.metadata().into_iter().map(|m| m.edition).collect();
    assert_eq!(editions, vec!["GeoIP2-Domain"]);

    let mut sink = VariableSink::new();
    service.resolve(Some(ip("71.160.223.137")), &mut sink);
    assert_eq!(sink.get_str("domain"), Some("verizon.net"));
}

#[tokio::test]
async fn test_successful_cycle_passes_through_swapping() {
    let bytes = read_fixture(DOMAIN_FIXTURE);
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = config_in(&temp_dir, &["GeoIP2-Domain"]);
    let service = Arc::new(GeoIpService::new());
    let mut fetcher = ScriptedFetcher::default();
    fetcher.files.insert("GeoIP2-Domain".to_string(), bytes);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let watched = Arc::clone(&service);
    let manager = RefreshManager::new(config, Arc::clone(&service), Arc::new(fetcher))
        .with_state_listener(move |state| {
            // The new set is not visible until the swap has finished
            recorder.lock().unwrap().push((state, watched.is_enabled()));
        });
    manager.refresh_once().await.expect("lock should be free");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (RefreshState::Fetching, false),
            (RefreshState::Swapping, false),
            (RefreshState::Idle, true),
        ]
    );
    assert_eq!(manager.state(), RefreshState::Idle);
}

#[tokio::test]
async fn test_http_download_of_archive_is_installed() {
    let bytes = read_fixture(DOMAIN_FIXTURE);
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/geoip/databases/GeoIP2-Domain/download"),
            request::query(url_decoded(contains(("suffix", "tar.gz")))),
        ])
        .respond_with(
            status_code(200).body(tar_gz("GeoIP2-Domain_20240101/GeoIP2-Domain.mmdb", &bytes)),
        ),
    );

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = GeoIpConfig {
        update_url: server.url("/").to_string(),
        ..config_in(&temp_dir, &["GeoIP2-Domain"])
    };
    let service = Arc::new(GeoIpService::new());
    let fetcher = HttpFetcher::new(&config).expect("valid update URL");

    let manager = RefreshManager::new(config, Arc::clone(&service), Arc::new(fetcher));
    let report = manager.refresh_once().await.expect("lock should be free");

    assert_eq!(report.updated, vec!["GeoIP2-Domain".to_string()]);
    assert!(service.is_enabled());
}
