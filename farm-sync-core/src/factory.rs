//! Log construction.
//!
//! Every log that enters the store, and every log that leaves for the server,
//! passes through a [`LogFactory`]. The factory owns the default field set;
//! the rest of the crate treats it as an opaque pure function.

use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{is_reserved_field, Fields, LocalId, Log, NewLog, OutboundLog, ResourceRef};

/// Where a log being built came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOrigin {
    /// Created on this device.
    LocalCreate,
    /// Fetched from the server and about to be stored.
    StoreFromServer,
}

/// Builds normalized logs and their server representation.
pub trait LogFactory: Send + Sync {
    /// Normalize raw fields into a log carrying `local_id`.
    fn build(&self, local_id: LocalId, new_log: NewLog, origin: LogOrigin) -> Log;

    /// Shape a stored log for sending to the server.
    fn to_server(&self, log: &Log) -> OutboundLog;
}

/// Factory that fills in a fixed set of default fields.
///
/// Defaults are `type = "farm_activity"`, `done = false` and a `timestamp`
/// of the build time in epoch seconds. Caller-supplied fields win.
#[derive(Debug, Clone)]
pub struct DefaultLogFactory {
    defaults: Fields,
}

impl DefaultLogFactory {
    pub fn new() -> Self {
        let mut defaults = Fields::new();
        defaults.insert("type".to_string(), json!("farm_activity"));
        defaults.insert("done".to_string(), json!(false));
        Self { defaults }
    }

    /// Replaces the default field set.
    pub fn with_defaults(defaults: Fields) -> Self {
        Self { defaults }
    }

    fn fields_for(&self, supplied: Fields) -> Fields {
        let mut fields = self.defaults.clone();
        fields
            .entry("timestamp".to_string())
            .or_insert_with(|| Value::from(Utc::now().timestamp()));
        fields.extend(supplied);
        fields
    }
}

impl Default for DefaultLogFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFactory for DefaultLogFactory {
    fn build(&self, local_id: LocalId, new_log: NewLog, origin: LogOrigin) -> Log {
        let NewLog {
            name,
            id,
            remote_uri,
            attached_assets,
            attached_areas,
            fields,
        } = new_log;

        let mut log = Log::new(local_id, name)
            .with_fields(self.fields_for(fields))
            .with_attachments(attached_assets, attached_areas)
            .with_pushed(origin == LogOrigin::StoreFromServer);
        if let Some(id) = id {
            log = log.with_remote_id(id);
        }
        log.remote_uri = remote_uri;
        log
    }

    fn to_server(&self, log: &Log) -> OutboundLog {
        OutboundLog {
            local_id: log.local_id(),
            id: log.id().map(str::to_string),
            name: log.name.clone(),
            field_farm_asset: log
                .attached_assets
                .iter()
                .map(|asset| ResourceRef::new(asset.id.clone()))
                .collect(),
            field_farm_area: log
                .attached_areas
                .iter()
                .map(|area| ResourceRef::new(area.tid.clone()))
                .collect(),
            fields: log
                .fields
                .iter()
                .filter(|(key, _)| !is_reserved_field(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Area, Asset};

    #[test]
    fn test_build_local_fills_defaults() {
        let factory = DefaultLogFactory::new();
        let log = factory.build(
            LocalId::new(),
            NewLog::new("Irrigate field A"),
            LogOrigin::LocalCreate,
        );

        assert_eq!(log.name, "Irrigate field A");
        assert_eq!(log.log_type(), Some("farm_activity"));
        assert_eq!(log.fields.get("done"), Some(&json!(false)));
        assert!(log.fields.get("timestamp").is_some());
        assert!(!log.was_pushed_to_server);
        assert!(log.is_draft());
    }

    #[test]
    fn test_supplied_fields_override_defaults() {
        let factory = DefaultLogFactory::new();
        let log = factory.build(
            LocalId::new(),
            NewLog::new("Seed").with_field("type", json!("farm_seeding")),
            LogOrigin::LocalCreate,
        );
        assert_eq!(log.log_type(), Some("farm_seeding"));
    }

    #[test]
    fn test_build_from_server_is_pushed() {
        let factory = DefaultLogFactory::new();
        let log = factory.build(
            LocalId::new(),
            NewLog::new("Harvest").with_remote_id("99"),
            LogOrigin::StoreFromServer,
        );
        assert_eq!(log.id(), Some("99"));
        assert!(log.was_pushed_to_server);
    }

    #[test]
    fn test_to_server_sends_reference_ids() {
        let factory = DefaultLogFactory::with_defaults(Fields::new());
        let log = factory.build(
            LocalId::new(),
            NewLog::new("Spray").with_attachments(
                vec![Asset::new("7", "Tractor")],
                vec![Area::new("3", "North field")],
            ),
            LogOrigin::LocalCreate,
        );

        let outbound = factory.to_server(&log);

        assert_eq!(outbound.local_id, log.local_id());
        assert!(outbound.id.is_none());
        assert_eq!(outbound.field_farm_asset, vec![ResourceRef::new("7")]);
        assert_eq!(outbound.field_farm_area, vec![ResourceRef::new("3")]);
    }

    #[test]
    fn test_to_server_drops_fields_shadowing_wire_keys() {
        let factory = DefaultLogFactory::new();
        let log = factory
            .build(LocalId::new(), NewLog::new("Real name"), LogOrigin::LocalCreate)
            .with_field("name", json!("Shadow"))
            .with_field("id", json!("5"))
            .with_field("field_farm_asset", json!([{"id": "9"}]))
            .with_field("notes", json!("kept"));

        let outbound = factory.to_server(&log);
        assert!(outbound.id.is_none());
        assert_eq!(outbound.name, "Real name");
        assert!(outbound.fields.keys().all(|key| !is_reserved_field(key)));
        assert_eq!(outbound.fields.get("notes"), Some(&json!("kept")));

        let body = serde_json::to_value(&outbound).unwrap();
        assert_eq!(body["name"], json!("Real name"));
        assert!(body.get("id").is_none());
        assert_eq!(body["field_farm_asset"], json!([]));
        // One occurrence of each key in the serialized text.
        let text = serde_json::to_string(&outbound).unwrap();
        assert_eq!(text.matches("\"name\"").count(), 1);
    }
}
