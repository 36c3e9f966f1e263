//! Decoded record types, one per schema family.
//!
//! Every field defaults, so a lookup miss or a sparsely populated entry still
//! yields a complete zero-valued record. Fields the database carries but the
//! projections never read are skipped during decoding.
//!
//! Field names mirror the database schema and are left undocumented.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use serde::Deserialize;

/// Locale code to localized name.
pub type Names = BTreeMap<String, String>;

/// Enterprise, City and Country database record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnterpriseRecord {
    pub city: CityRecord,
    pub continent: ContinentRecord,
    pub country: CountryRecord,
    pub location: LocationRecord,
    pub postal: PostalRecord,
    pub registered_country: CountryRecord,
    pub represented_country: RepresentedCountryRecord,
    pub subdivisions: Vec<SubdivisionRecord>,
    pub traits: TraitsRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CityRecord {
    pub confidence: u8,
    pub geoname_id: u32,
    pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContinentRecord {
    pub code: String,
    pub geoname_id: u32,
    pub names: Names,
}

/// Country section; also used for `registered_country`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CountryRecord {
    pub confidence: u8,
    pub geoname_id: u32,
    pub is_in_european_union: bool,
    pub iso_code: String,
    pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepresentedCountryRecord {
    pub geoname_id: u32,
    pub is_in_european_union: bool,
    pub iso_code: String,
    pub names: Names,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocationRecord {
    pub accuracy_radius: u16,
    pub latitude: f64,
    pub longitude: f64,
    pub metro_code: u16,
    pub time_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostalRecord {
    pub code: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubdivisionRecord {
    pub confidence: u8,
    pub geoname_id: u32,
    pub iso_code: String,
    pub names: Names,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraitsRecord {
    pub autonomous_system_number: u32,
    pub autonomous_system_organization: String,
    pub connection_type: String,
    pub domain: String,
    pub is_anonymous_proxy: bool,
    pub is_anycast: bool,
    pub is_legitimate_proxy: bool,
    pub is_satellite_provider: bool,
    pub isp: String,
    pub mobile_country_code: String,
    pub mobile_network_code: String,
    pub organization: String,
    pub static_ip_score: f64,
    pub user_type: String,
}

/// ISP and ASN database record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IspRecord {
    pub autonomous_system_number: u32,
    pub autonomous_system_organization: String,
    pub isp: String,
    pub mobile_country_code: String,
    pub mobile_network_code: String,
    pub organization: String,
}

/// Connection-type database record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionTypeRecord {
    pub connection_type: String,
}

/// Domain database record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomainRecord {
    pub domain: String,
}

/// Anonymous-IP database record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnonymousIpRecord {
    pub is_anonymous: bool,
    pub is_anonymous_vpn: bool,
    pub is_hosting_provider: bool,
    pub is_public_proxy: bool,
    pub is_residential_proxy: bool,
    pub is_tor_exit_node: bool,
}
