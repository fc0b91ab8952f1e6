use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::remote::string_or_number;

/// A taxonomy-backed area (field, bed, greenhouse...).
///
/// The geometry is kept as received; nothing in this crate interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(deserialize_with = "string_or_number")]
    pub tid: String,
    pub name: String,
    #[serde(rename = "field_farm_geofield", default)]
    pub geofield: Value,
}

impl Area {
    pub fn new(tid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tid: tid.into(),
            name: name.into(),
            geofield: Value::Null,
        }
    }

    pub fn with_geofield(mut self, geofield: Value) -> Self {
        self.geofield = geofield;
        self
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.tid)
    }
}

/// Unit of measure taxonomy term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(deserialize_with = "string_or_number")]
    pub tid: String,
    pub name: String,
}

impl Unit {
    pub fn new(tid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tid: tid.into(),
            name: name.into(),
        }
    }
}

/// Log category taxonomy term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "string_or_number")]
    pub tid: String,
    pub name: String,
}

impl Category {
    pub fn new(tid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tid: tid.into(),
            name: name.into(),
        }
    }
}
