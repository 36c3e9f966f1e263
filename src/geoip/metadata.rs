//! Metadata extraction for GeoIP databases.

use maxminddb::Reader;
use std::path::Path;

use super::schema::SchemaFamily;
use super::types::GeoIpMetadata;

/// Extracts metadata from an opened GeoIP database
pub(crate) fn extract_metadata<T: AsRef<[u8]>>(
    reader: &Reader<T>,
    path: &Path,
    edition: &str,
    family: SchemaFamily,
) -> GeoIpMetadata {
    // MaxMind databases carry a build_epoch field in their metadata
    let version = format!("build_{}", reader.metadata.build_epoch);

    GeoIpMetadata {
        edition: edition.to_string(),
        family: family.as_str().to_string(),
        database_type: reader.metadata.database_type.clone(),
        version,
        path: path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_metadata_serializes_round_trip() {
        let metadata = GeoIpMetadata {
            edition: "GeoLite2-ASN".to_string(),
            family: "isp".to_string(),
            database_type: "GeoLite2-ASN".to_string(),
            version: "build_1700000000".to_string(),
            path: PathBuf::from("/tmp/GeoLite2-ASN.mmdb"),
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"family\":\"isp\""));
        let back: GeoIpMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
