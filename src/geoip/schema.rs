//! Schema family detection.
//!
//! Every supported database declares a `database_type` in its metadata. This
//! module maps that identifier onto one of five closed schema families through a
//! static table. Anything not in the table is rejected.

use std::fmt;

use maxminddb::Reader;
use strum_macros::EnumIter as EnumIterMacro;

use crate::error_handling::GeoIpError;
use crate::geoip::records::{
    AnonymousIpRecord, ConnectionTypeRecord, DomainRecord, EnterpriseRecord, IspRecord,
};
use crate::geoip::Projection;
use crate::variables::VariableSink;

/// Database types decoded as Enterprise/City/Country records.
const ENTERPRISE_TYPES: &[&str] = &[
    "DBIP-City-Lite",
    "DBIP-Country",
    "DBIP-Country-Lite",
    "DBIP-ISP (compat=Enterprise)",
    "DBIP-Location (compat=City)",
    "DBIP-Location-ISP (compat=Enterprise)",
    "GeoIP2-City",
    "GeoIP2-City-Africa",
    "GeoIP2-City-Asia-Pacific",
    "GeoIP2-City-Europe",
    "GeoIP2-City-North-America",
    "GeoIP2-City-South-America",
    "GeoIP2-Country",
    "GeoIP2-Enterprise",
    "GeoIP2-Precision-City",
    "GeoLite2-City",
    "GeoLite2-Country",
];

/// Database types decoded as ISP/ASN records.
const ISP_TYPES: &[&str] = &[
    "DBIP-ASN-Lite (compat=GeoLite2-ASN)",
    "GeoIP2-ISP",
    "GeoIP2-Precision-ISP",
    "GeoLite2-ASN",
];

const CONNECTION_TYPE_TYPES: &[&str] = &["GeoIP2-Connection-Type"];

const DOMAIN_TYPES: &[&str] = &["GeoIP2-Domain"];

const ANONYMOUS_TYPES: &[&str] = &["GeoIP2-Anonymous-IP"];

/// The closed set of database content shapes this crate can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum SchemaFamily {
    /// Enterprise, City and Country databases (and their regional/compat aliases)
    Enterprise,
    /// ISP and ASN databases
    Isp,
    /// Connection-type databases
    ConnectionType,
    /// Domain databases
    Domain,
    /// Anonymous-IP databases
    Anonymous,
}

impl SchemaFamily {
    /// Maps a declared `database_type` onto its family by exact match.
    pub fn from_database_type(database_type: &str) -> Result<Self, GeoIpError> {
        let family = if ENTERPRISE_TYPES.contains(&database_type) {
            SchemaFamily::Enterprise
        } else if ISP_TYPES.contains(&database_type) {
            SchemaFamily::Isp
        } else if CONNECTION_TYPE_TYPES.contains(&database_type) {
            SchemaFamily::ConnectionType
        } else if DOMAIN_TYPES.contains(&database_type) {
            SchemaFamily::Domain
        } else if ANONYMOUS_TYPES.contains(&database_type) {
            SchemaFamily::Anonymous
        } else {
            return Err(GeoIpError::UnsupportedSchema {
                database_type: database_type.to_string(),
            });
        };
        Ok(family)
    }

    /// Classifies an opened database by its metadata.
    pub fn detect<S: AsRef<[u8]>>(reader: &Reader<S>) -> Result<Self, GeoIpError> {
        Self::from_database_type(&reader.metadata.database_type)
    }

    /// Short tag used in logs and metadata reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFamily::Enterprise => "enterprise",
            SchemaFamily::Isp => "isp",
            SchemaFamily::ConnectionType => "connection_type",
            SchemaFamily::Domain => "domain",
            SchemaFamily::Anonymous => "anonymous",
        }
    }

    /// Writes every variable this family owns at its default value.
    pub fn prime(&self, sink: &mut VariableSink) {
        match self {
            SchemaFamily::Enterprise => EnterpriseRecord::default().project(sink),
            SchemaFamily::Isp => IspRecord::default().project(sink),
            SchemaFamily::ConnectionType => ConnectionTypeRecord::default().project(sink),
            SchemaFamily::Domain => DomainRecord::default().project(sink),
            SchemaFamily::Anonymous => AnonymousIpRecord::default().project(sink),
        }
    }
}

impl fmt::Display for SchemaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
