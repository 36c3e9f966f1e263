//! Opened GeoIP databases.
//!
//! A [`GeoDatabase`] pairs one MaxMind reader with the projection its schema
//! family selects. The [`Resolver`] trait is the seam the lookup service
//! dispatches through.

use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::Path;

use maxminddb::Reader;

use crate::error_handling::GeoIpError;
use crate::geoip::metadata::extract_metadata;
use crate::geoip::project::Projection;
use crate::geoip::records::{
    AnonymousIpRecord, ConnectionTypeRecord, DomainRecord, EnterpriseRecord, IspRecord,
};
use crate::geoip::schema::SchemaFamily;
use crate::geoip::types::GeoIpMetadata;
use crate::variables::VariableSink;

/// Something that can resolve an address into variables.
///
/// Implementations are shared across request threads and must never be
/// mutated once installed in an active set.
pub trait Resolver: Send + Sync {
    /// Schema family this resolver projects.
    fn family(&self) -> SchemaFamily;

    /// Describes the underlying database.
    fn metadata(&self) -> &GeoIpMetadata;

    /// Looks up `ip` and merges the projected variables into `sink`.
    ///
    /// A miss projects the zero-valued record. On error nothing is written.
    fn resolve(&self, ip: IpAddr, sink: &mut VariableSink) -> Result<(), GeoIpError>;
}

/// A MaxMind database held in memory together with its detected family.
pub struct GeoDatabase {
    reader: Reader<Vec<u8>>,
    family: SchemaFamily,
    metadata: GeoIpMetadata,
}

impl std::fmt::Debug for GeoDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoDatabase")
            .field("family", &self.family)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl GeoDatabase {
    /// Reads `path` and opens it as the database for `edition`.
    pub async fn open(path: &Path, edition: &str) -> Result<Self, GeoIpError> {
        log::debug!("Loading GeoIP database {} from {}", edition, path.display());

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                GeoIpError::MissingDatabaseFile {
                    edition: edition.to_string(),
                    path: path.to_path_buf(),
                }
            } else {
                GeoIpError::io(path, e)
            }
        })?;

        Self::from_bytes(bytes, path, edition)
    }

    /// Opens an in-memory database image. `path` is only recorded in metadata.
    pub fn from_bytes(bytes: Vec<u8>, path: &Path, edition: &str) -> Result<Self, GeoIpError> {
        let reader = Reader::from_source(bytes).map_err(|source| GeoIpError::InvalidDatabase {
            path: path.to_path_buf(),
            source,
        })?;
        let family = SchemaFamily::detect(&reader)?;
        let metadata = extract_metadata(&reader, path, edition, family);
        Ok(Self {
            reader,
            family,
            metadata,
        })
    }

    fn decode<T: Projection>(&self, ip: IpAddr) -> Result<T, GeoIpError> {
        let decode_error = |source| GeoIpError::LookupDecode {
            edition: self.metadata.edition.clone(),
            ip,
            source,
        };

        let lookup = self.reader.lookup(ip).map_err(decode_error)?;
        if !lookup.has_data() {
            return Ok(T::default());
        }
        match lookup.decode::<T>() {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Ok(T::default()),
            Err(e) => Err(decode_error(e)),
        }
    }

    fn resolve_as<T: Projection>(&self, ip: IpAddr, sink: &mut VariableSink) -> Result<(), GeoIpError> {
        let record: T = self.decode(ip)?;
        record.project(sink);
        log::debug!(
            "Lookup {} ({}) for {}: {:?}",
            self.metadata.edition,
            T::FAMILY,
            ip,
            record
        );
        Ok(())
    }
}

impl Resolver for GeoDatabase {
    fn family(&self) -> SchemaFamily {
        self.family
    }

    fn metadata(&self) -> &GeoIpMetadata {
        &self.metadata
    }

    fn resolve(&self, ip: IpAddr, sink: &mut VariableSink) -> Result<(), GeoIpError> {
        match self.family {
            SchemaFamily::Enterprise => self.resolve_as::<EnterpriseRecord>(ip, sink),
            SchemaFamily::Isp => self.resolve_as::<IspRecord>(ip, sink),
            SchemaFamily::ConnectionType => self.resolve_as::<ConnectionTypeRecord>(ip, sink),
            SchemaFamily::Domain => self.resolve_as::<DomainRecord>(ip, sink),
            SchemaFamily::Anonymous => self.resolve_as::<AnonymousIpRecord>(ip, sink),
        }
    }
}
