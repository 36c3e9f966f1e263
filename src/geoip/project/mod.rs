//! Field projection.
//!
//! Each schema family flattens its decoded record into `geoip2.*` variables.
//! Projecting a default record writes every key the family owns at its zero
//! value, which is how a sink gets primed before lookups run.

mod anonymous;
mod connection_type;
mod domain;
mod enterprise;
mod isp;

use serde::de::DeserializeOwned;

use crate::geoip::records::Names;
use crate::geoip::schema::SchemaFamily;
use crate::variables::VariableSink;

pub use enterprise::padded_subdivisions;

/// Locales flattened into `*_names_<locale>` keys, independent of the locales a
/// record happens to carry.
pub const LANGUAGE_CODES: &[&str] = &["de", "en", "es", "fr", "ja", "pt-BR", "ru", "zh-CN"];

/// Locale mirrored into the unlocalized `*_name` convenience key.
pub const PRIMARY_LOCALE: &str = "en";

/// Minimum number of subdivision entries a projection emits.
pub const SUBDIVISION_SIZE: usize = 2;

/// A decoded record that can flatten itself into a variable sink.
pub trait Projection: DeserializeOwned + Default + std::fmt::Debug {
    /// Family whose databases decode into this record.
    const FAMILY: SchemaFamily;

    /// Writes this record's variables. Never fails; absent data projects as defaults.
    fn project(&self, sink: &mut VariableSink);
}

/// Writes the raw mapping, one key per supported locale, and the `*_name` alias.
///
/// A locale missing from `names` is emitted as an empty string.
pub(crate) fn set_names(sink: &mut VariableSink, prefix: &str, names: &Names) {
    sink.set(&format!("{}_names", prefix), names);
    for lc in LANGUAGE_CODES {
        let value = names.get(*lc).map(String::as_str).unwrap_or("");
        sink.set(&format!("{}_names_{}", prefix, lc), value);
        if *lc == PRIMARY_LOCALE {
            sink.set(&format!("{}_name", prefix), value);
        }
    }
}
