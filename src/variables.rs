//! Per-request variable set.
//!
//! A [`VariableSink`] collects the flat `geoip2.*` variables a lookup produces.
//! Writes are last-wins. Every key a schema family can write is primed with
//! its default before lookups run, so a miss never leaves a key undefined.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::VAR_PREFIX;

/// A single variable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VarValue {
    /// Text value (empty string when absent)
    Str(String),
    /// Flag (false when absent)
    Bool(bool),
    /// Unsigned integer (0 when absent)
    UInt(u64),
    /// Floating point value at full precision (0.0 when absent)
    Float(f64),
    /// Raw locale code to localized name mapping
    Names(BTreeMap<String, String>),
    /// Raw sequence, such as the padded subdivision entries
    List(Vec<VarValue>),
    /// Raw structured entry of a sequence
    Map(BTreeMap<String, VarValue>),
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Str(s) => f.write_str(s),
            VarValue::Bool(b) => write!(f, "{}", b),
            VarValue::UInt(n) => write!(f, "{}", n),
            VarValue::Float(x) => write!(f, "{}", x),
            VarValue::Names(_) | VarValue::List(_) | VarValue::Map(_) => {
                let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

impl From<String> for VarValue {
    fn from(v: String) -> Self {
        VarValue::Str(v)
    }
}

impl From<&str> for VarValue {
    fn from(v: &str) -> Self {
        VarValue::Str(v.to_string())
    }
}

impl From<&String> for VarValue {
    fn from(v: &String) -> Self {
        VarValue::Str(v.clone())
    }
}

impl From<bool> for VarValue {
    fn from(v: bool) -> Self {
        VarValue::Bool(v)
    }
}

impl From<u8> for VarValue {
    fn from(v: u8) -> Self {
        VarValue::UInt(v.into())
    }
}

impl From<u16> for VarValue {
    fn from(v: u16) -> Self {
        VarValue::UInt(v.into())
    }
}

impl From<u32> for VarValue {
    fn from(v: u32) -> Self {
        VarValue::UInt(v.into())
    }
}

impl From<u64> for VarValue {
    fn from(v: u64) -> Self {
        VarValue::UInt(v)
    }
}

impl From<f64> for VarValue {
    fn from(v: f64) -> Self {
        VarValue::Float(v)
    }
}

impl From<&BTreeMap<String, String>> for VarValue {
    fn from(v: &BTreeMap<String, String>) -> Self {
        VarValue::Names(v.clone())
    }
}

/// Ordered `geoip2.*` variable set for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableSink {
    vars: BTreeMap<String, VarValue>,
}

impl VariableSink {
    /// Creates an empty sink. Most callers want [`VariableSink::primed`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink holding every known variable at its default value.
    pub fn primed() -> Self {
        let mut sink = Self::new();
        crate::geoip::prime_defaults(&mut sink);
        sink
    }

    /// Full variable key for `name`, e.g. `country_code` -> `geoip2.country_code`.
    pub fn key(name: &str) -> String {
        format!("{}{}", VAR_PREFIX, name)
    }

    /// Sets `name` (unprefixed), replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<VarValue>) {
        self.vars.insert(Self::key(name), value.into());
    }

    /// Value of `name` (unprefixed).
    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(&Self::key(name))
    }

    /// Text value of `name`, if it holds one.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(VarValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether `name` (unprefixed) has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(&Self::key(name))
    }

    /// Number of variables held.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variable has been set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates full keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VarValue)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}
