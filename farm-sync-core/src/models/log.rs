use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::area::Area;
use super::asset::Asset;
use super::local_id::LocalId;

/// Free-form log attributes (`type`, `done`, `timestamp`, quantities...).
pub type Fields = Map<String, Value>;

/// A field-activity record and the unit of synchronization.
///
/// `local_id` and `id` are only reachable through accessors: the first never
/// changes after construction and the second can be set but never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    local_id: LocalId,
    id: Option<String>,
    pub remote_uri: Option<String>,
    pub name: String,
    pub was_pushed_to_server: bool,
    pub is_ready_to_sync: bool,
    #[serde(default)]
    pub attached_assets: Vec<Asset>,
    #[serde(default)]
    pub attached_areas: Vec<Area>,
    #[serde(default)]
    pub fields: Fields,
}

impl Log {
    /// A local draft: no remote id, not pushed, ready to sync.
    pub fn new(local_id: LocalId, name: impl Into<String>) -> Self {
        Self {
            local_id,
            id: None,
            remote_uri: None,
            name: name.into(),
            was_pushed_to_server: false,
            is_ready_to_sync: true,
            attached_assets: Vec::new(),
            attached_areas: Vec::new(),
            fields: Fields::new(),
        }
    }

    pub fn local_id(&self) -> LocalId {
        self.local_id
    }

    /// Remote identifier, absent for drafts.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    pub fn with_remote_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn with_attachments(mut self, assets: Vec<Asset>, areas: Vec<Area>) -> Self {
        self.attached_assets = assets;
        self.attached_areas = areas;
        self
    }

    pub fn with_pushed(mut self, pushed: bool) -> Self {
        self.was_pushed_to_server = pushed;
        self
    }

    /// The `type` field, if any.
    pub fn log_type(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// Merge a patch over this log and return the result.
    ///
    /// Absent patch members leave the log untouched. A patch can assign a
    /// remote id but cannot remove one.
    pub fn apply(mut self, patch: LogPatch) -> Self {
        let LogPatch {
            name,
            id,
            remote_uri,
            was_pushed_to_server,
            is_ready_to_sync,
            attached_assets,
            attached_areas,
            fields,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(id) = id {
            self.id = Some(id);
        }
        if let Some(uri) = remote_uri {
            self.remote_uri = Some(uri);
        }
        if let Some(pushed) = was_pushed_to_server {
            self.was_pushed_to_server = pushed;
        }
        if let Some(ready) = is_ready_to_sync {
            self.is_ready_to_sync = ready;
        }
        if let Some(assets) = attached_assets {
            self.attached_assets = assets;
        }
        if let Some(areas) = attached_areas {
            self.attached_areas = areas;
        }
        self.fields.extend(fields);
        self
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log: {}", self.name)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "Local ID: {}", self.local_id)?;
        match &self.id {
            Some(id) => writeln!(f, "Remote ID: {}", id)?,
            None => writeln!(f, "Remote ID: (draft)")?,
        }
        if let Some(uri) = &self.remote_uri {
            writeln!(f, "URI: {}", uri)?;
        }
        writeln!(
            f,
            "Status: {}{}",
            if self.was_pushed_to_server {
                "synced"
            } else {
                "modified locally"
            },
            if self.is_ready_to_sync {
                ""
            } else {
                " (sync paused)"
            }
        )?;

        if !self.attached_assets.is_empty() {
            writeln!(f, "Assets:")?;
            for asset in &self.attached_assets {
                writeln!(f, "  - {}", asset)?;
            }
        }
        if !self.attached_areas.is_empty() {
            writeln!(f, "Areas:")?;
            for area in &self.attached_areas {
                writeln!(f, "  - {}", area)?;
            }
        }
        for (key, value) in &self.fields {
            writeln!(f, "{}: {}", key, value)?;
        }

        Ok(())
    }
}

/// Caller-supplied fields for a log entering the store.
///
/// Carries an `id` only when the record originated on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLog {
    pub name: String,
    pub id: Option<String>,
    pub remote_uri: Option<String>,
    pub attached_assets: Vec<Asset>,
    pub attached_areas: Vec<Area>,
    pub fields: Fields,
}

impl NewLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_remote_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_attachments(mut self, assets: Vec<Asset>, areas: Vec<Area>) -> Self {
        self.attached_assets = assets;
        self.attached_areas = areas;
        self
    }
}

/// A partial update to a log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogPatch {
    pub name: Option<String>,
    pub id: Option<String>,
    pub remote_uri: Option<String>,
    pub was_pushed_to_server: Option<bool>,
    pub is_ready_to_sync: Option<bool>,
    pub attached_assets: Option<Vec<Asset>>,
    pub attached_areas: Option<Vec<Area>>,
    pub fields: Fields,
}

impl LogPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn with_pushed(mut self, pushed: bool) -> Self {
        self.was_pushed_to_server = Some(pushed);
        self
    }

    pub fn with_ready_to_sync(mut self, ready: bool) -> Self {
        self.is_ready_to_sync = Some(ready);
        self
    }

    pub fn with_attached_assets(mut self, assets: Vec<Asset>) -> Self {
        self.attached_assets = Some(assets);
        self
    }

    pub fn with_attached_areas(mut self, areas: Vec<Area>) -> Self {
        self.attached_areas = Some(areas);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
