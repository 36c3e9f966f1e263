//! Enterprise/City/Country projection.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::geoip::project::{set_names, Projection, SUBDIVISION_SIZE};
use crate::geoip::records::{EnterpriseRecord, SubdivisionRecord};
use crate::geoip::schema::SchemaFamily;
use crate::variables::{VarValue, VariableSink};

/// Subdivisions padded with empty entries up to [`SUBDIVISION_SIZE`], order preserved.
pub fn padded_subdivisions(subdivisions: &[SubdivisionRecord]) -> Cow<'_, [SubdivisionRecord]> {
    if subdivisions.len() >= SUBDIVISION_SIZE {
        return Cow::Borrowed(subdivisions);
    }
    let mut padded = subdivisions.to_vec();
    padded.resize_with(SUBDIVISION_SIZE, SubdivisionRecord::default);
    Cow::Owned(padded)
}

/// Raw form of one subdivision entry, as exposed in `subdivisions`.
fn subdivision_value(subdivision: &SubdivisionRecord) -> VarValue {
    let mut entry: BTreeMap<String, VarValue> = BTreeMap::new();
    entry.insert("confidence".to_string(), subdivision.confidence.into());
    entry.insert("geoname_id".to_string(), subdivision.geoname_id.into());
    entry.insert("iso_code".to_string(), (&subdivision.iso_code).into());
    entry.insert("names".to_string(), (&subdivision.names).into());
    VarValue::Map(entry)
}

impl Projection for EnterpriseRecord {
    const FAMILY: SchemaFamily = SchemaFamily::Enterprise;

    fn project(&self, sink: &mut VariableSink) {
        // Country
        sink.set("country_code", &self.country.iso_code);
        sink.set("country_confidence", self.country.confidence);
        sink.set("country_eu", self.country.is_in_european_union);
        sink.set("country_geoname_id", self.country.geoname_id);
        set_names(sink, "country", &self.country.names);

        // Continent
        sink.set("continent_code", &self.continent.code);
        sink.set("continent_geoname_id", self.continent.geoname_id);
        set_names(sink, "continent", &self.continent.names);

        // City
        sink.set("city_confidence", self.city.confidence);
        sink.set("city_geoname_id", self.city.geoname_id);
        set_names(sink, "city", &self.city.names);

        // Location
        sink.set("location_latitude", self.location.latitude);
        sink.set("location_longitude", self.location.longitude);
        sink.set("location_time_zone", &self.location.time_zone);
        sink.set("location_accuracy_radius", self.location.accuracy_radius);
        sink.set("location_metro_code", self.location.metro_code);

        // Postal
        sink.set("postal_code", &self.postal.code);
        sink.set("postal_confidence", self.postal.confidence);

        // Registered country
        let registered = &self.registered_country;
        sink.set("registeredcountry_geoname_id", registered.geoname_id);
        sink.set(
            "registeredcountry_is_in_european_union",
            registered.is_in_european_union,
        );
        sink.set("registeredcountry_iso_code", &registered.iso_code);
        set_names(sink, "registeredcountry", &registered.names);

        // Represented country
        let represented = &self.represented_country;
        sink.set("representedcountry_geoname_id", represented.geoname_id);
        sink.set(
            "representedcountry_is_in_european_union",
            represented.is_in_european_union,
        );
        sink.set("representedcountry_iso_code", &represented.iso_code);
        sink.set("representedcountry_type", &represented.kind);
        set_names(sink, "representedcountry", &represented.names);

        // Subdivisions: the raw padded list, then 1-based flat keys
        let subdivisions = padded_subdivisions(&self.subdivisions);
        sink.set(
            "subdivisions",
            VarValue::List(subdivisions.iter().map(subdivision_value).collect()),
        );
        for (index, subdivision) in subdivisions.iter().enumerate() {
            let prefix = format!("subdivisions_{}", index + 1);
            sink.set(&format!("{}_confidence", prefix), subdivision.confidence);
            sink.set(&format!("{}_geoname_id", prefix), subdivision.geoname_id);
            sink.set(&format!("{}_iso_code", prefix), &subdivision.iso_code);
            set_names(sink, &prefix, &subdivision.names);
        }

        // Traits
        let traits = &self.traits;
        sink.set(
            "traits_autonomous_system_number",
            traits.autonomous_system_number,
        );
        sink.set(
            "traits_autonomous_system_organization",
            &traits.autonomous_system_organization,
        );
        sink.set("traits_connection_type", &traits.connection_type);
        sink.set("traits_domain", &traits.domain);
        sink.set("traits_is_anonymous_proxy", traits.is_anonymous_proxy);
        sink.set("traits_is_anycast", traits.is_anycast);
        sink.set("traits_is_legitimate_proxy", traits.is_legitimate_proxy);
        sink.set("traits_is_satellite_provider", traits.is_satellite_provider);
        sink.set("traits_isp", &traits.isp);
        sink.set("traits_mobile_country_code", &traits.mobile_country_code);
        sink.set("traits_mobile_network_code", &traits.mobile_network_code);
        sink.set("traits_organization", &traits.organization);
        sink.set("traits_static_ip_score", traits.static_ip_score);
        sink.set("traits_user_type", &traits.user_type);
    }
}
