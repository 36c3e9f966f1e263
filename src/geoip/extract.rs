//! Archive extraction utilities.
//!
//! The update service ships databases as tar.gz archives holding
//! `<edition>.mmdb` somewhere in a dated directory.

use std::io::Read;

use flate2::read::GzDecoder;
use tar::Archive;

/// Gzip magic number.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `bytes` start with the gzip magic number.
pub(crate) fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Extracts `<edition>.mmdb` from a tar.gz archive.
///
/// Only the entry's file name is compared, so nested or traversal-style paths
/// never influence where anything is written.
pub(crate) fn extract_mmdb_from_tar_gz(tar_gz_bytes: &[u8], edition: &str) -> std::io::Result<Vec<u8>> {
    log::debug!("Extracting {}.mmdb from tar.gz archive", edition);

    let expected_name = format!("{}.mmdb", edition);
    let mut archive = Archive::new(GzDecoder::new(tar_gz_bytes));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let matches = entry
            .path()?
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name == expected_name)
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let mut mmdb_bytes = Vec::new();
        entry.read_to_end(&mut mmdb_bytes)?;
        log::info!(
            "Extracted {} from tar.gz ({} bytes)",
            expected_name,
            mmdb_bytes.len()
        );
        return Ok(mmdb_bytes);
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} not found in tar.gz archive", expected_name),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tar::Builder;

    /// Creates a test tar.gz archive with the specified files.
    fn create_test_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut tar_builder = Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(content.len() as u64);
            header.set_cksum();
            tar_builder.append(&header, *content).unwrap();
        }
        let tar_bytes = tar_builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_extract_from_dated_directory() {
        let tar_gz = create_test_tar_gz(&[
            ("GeoLite2-ASN_20240101/COPYRIGHT.txt", b"copyright"),
            ("GeoLite2-ASN_20240101/GeoLite2-ASN.mmdb", b"fake mmdb content"),
        ]);

        let result = extract_mmdb_from_tar_gz(&tar_gz, "GeoLite2-ASN").unwrap();
        assert_eq!(result, b"fake mmdb content");
    }

    #[test]
    fn test_extract_not_found() {
        let tar_gz = create_test_tar_gz(&[("GeoLite2-City.mmdb", b"city")]);

        let err = extract_mmdb_from_tar_gz(&tar_gz, "GeoLite2-ASN").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("GeoLite2-ASN.mmdb not found"));
    }

    #[test]
    fn test_extract_is_case_sensitive() {
        let tar_gz = create_test_tar_gz(&[("geolite2-city.mmdb", b"lower")]);
        assert!(extract_mmdb_from_tar_gz(&tar_gz, "GeoLite2-City").is_err());
    }

    #[test]
    fn test_extract_invalid_gzip() {
        assert!(extract_mmdb_from_tar_gz(b"not a valid tar.gz file", "GeoLite2-City").is_err());
    }

    #[test]
    fn test_extract_corrupted_tar() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"not a valid tar file").unwrap();
        let corrupted_gz = encoder.finish().unwrap();

        assert!(extract_mmdb_from_tar_gz(&corrupted_gz, "GeoLite2-City").is_err());
    }

    #[test]
    fn test_is_gzip() {
        let tar_gz = create_test_tar_gz(&[]);
        assert!(is_gzip(&tar_gz));
        assert!(!is_gzip(b"\xab\xcd\xefMaxMind.com"));
        assert!(!is_gzip(&[0x1f]));
        assert!(!is_gzip(&[]));
        assert!(is_gzip(&GZIP_MAGIC));
    }
}
