use serde::{Deserialize, Serialize};
use std::fmt;

use super::remote::string_or_number;

/// Asset type used by the equipment listing.
pub const EQUIPMENT: &str = "equipment";

/// A farm asset (equipment, planting, animal...) a log can be attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

impl Asset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset_type: None,
        }
    }

    pub fn with_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn is_equipment(&self) -> bool {
        self.asset_type.as_deref() == Some(EQUIPMENT)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}
