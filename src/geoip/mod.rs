//! GeoIP lookup using MaxMind GeoIP2/GeoLite2 databases.
//!
//! This module detects the schema family of each database, decodes records,
//! projects them into `geoip2.*` variables, and serves lookups from an
//! atomically replaceable set of open databases.

mod database;
pub(crate) mod extract;
mod init;
mod lookup;
mod metadata;
mod project;
mod records;
mod schema;
mod types;

use strum::IntoEnumIterator;

use crate::variables::VariableSink;

// Re-export public API
pub use database::{GeoDatabase, Resolver};
pub use init::{init_geoip, load_active_set, LoadOutcome};
pub use lookup::{retire, ActiveSet, GeoIpService};
pub use project::{padded_subdivisions, Projection, LANGUAGE_CODES, PRIMARY_LOCALE, SUBDIVISION_SIZE};
pub use records::{
    AnonymousIpRecord, CityRecord, ConnectionTypeRecord, ContinentRecord, CountryRecord,
    DomainRecord, EnterpriseRecord, IspRecord, LocationRecord, Names, PostalRecord,
    RepresentedCountryRecord, SubdivisionRecord, TraitsRecord,
};
pub use schema::SchemaFamily;
pub use types::GeoIpMetadata;

/// Sets `ip_address` and every family's variables to their defaults.
///
/// Run once per request before any lookup so that misses, decode failures, and
/// absent databases all leave a complete, well-known variable set.
pub fn prime_defaults(sink: &mut VariableSink) {
    sink.set("ip_address", "");
    for family in SchemaFamily::iter() {
        family.prime(sink);
    }
}
