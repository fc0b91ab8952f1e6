//! Wire shapes exchanged with the farm server.
//!
//! The server speaks the farmOS 1.x JSON dialect: logs reference assets and
//! areas through `field_farm_asset` / `field_farm_area` lists of `{id}`
//! objects, list endpoints wrap results in `{"list": [...]}`, and identifiers
//! may arrive either as strings or as bare numbers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::local_id::LocalId;

/// Accepts `"7"` or `7` and yields `"7"`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or numeric identifier, got {}",
            other
        ))),
    }
}

pub(crate) fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a string or numeric identifier, got {}",
            other
        ))),
    }
}

/// A `{id}` cross-reference embedded in a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource: None,
        }
    }
}

/// A log as returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteLog {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field_farm_asset: Vec<ResourceRef>,
    #[serde(default)]
    pub field_farm_area: Vec<ResourceRef>,
    /// Every other attribute, kept verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteLog {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_farm_asset: Vec::new(),
            field_farm_area: Vec::new(),
            fields: Map::new(),
        }
    }

    pub fn with_asset_refs<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_farm_asset = ids.into_iter().map(ResourceRef::new).collect();
        self
    }

    pub fn with_area_refs<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_farm_area = ids.into_iter().map(ResourceRef::new).collect();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Response body of a log query: either one log or a `list` of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LogPayload {
    Batch { list: Vec<RemoteLog> },
    Single(RemoteLog),
}

impl LogPayload {
    pub fn into_logs(self) -> Vec<RemoteLog> {
        match self {
            LogPayload::Batch { list } => list,
            LogPayload::Single(log) => vec![log],
        }
    }
}

impl From<Vec<RemoteLog>> for LogPayload {
    fn from(list: Vec<RemoteLog>) -> Self {
        LogPayload::Batch { list }
    }
}

/// Generic `{"list": [...]}` envelope used by reference endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

/// Keys `OutboundLog` writes itself; free-form fields never carry them.
pub const RESERVED_FIELDS: [&str; 4] = ["id", "name", "field_farm_asset", "field_farm_area"];

/// Whether `key` collides with a top-level key of the outbound body.
pub fn is_reserved_field(key: &str) -> bool {
    RESERVED_FIELDS.contains(&key)
}

/// A log serialized for sending to the server.
///
/// Local bookkeeping (sync flags, resolved attachments) is stripped; only the
/// identifiers of attached resources are sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundLog {
    #[serde(skip)]
    pub local_id: LocalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub field_farm_asset: Vec<ResourceRef>,
    pub field_farm_area: Vec<ResourceRef>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Server acknowledgement of a create or update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushReceipt {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl PushReceipt {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            uri: Some(uri.into()),
        }
    }
}
