//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::IpAddr;
use std::path::PathBuf;

use geoip2_vars::{GeoDatabase, VarValue};

/// Location of a MaxMind test database.
pub fn fixture_path(file_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(file_name)
}

/// Opens a MaxMind test database from `tests/data/`.
pub async fn open_fixture(file_name: &str) -> GeoDatabase {
    let path = fixture_path(file_name);
    assert!(
        path.exists(),
        "{} is missing; run tests/data/generate_fixtures.py",
        path.display()
    );
    let edition = file_name.trim_end_matches(".mmdb");
    GeoDatabase::open(&path, edition)
        .await
        .unwrap_or_else(|e| panic!("opening {}: {}", path.display(), e))
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test IP")
}

pub fn text(s: &str) -> VarValue {
    VarValue::Str(s.to_string())
}
