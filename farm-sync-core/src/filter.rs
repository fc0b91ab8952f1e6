//! Log queries.
//!
//! A [`LogFilter`] is used twice during a pull: as a predicate to narrow the
//! local collection, and as query parameters for the server request.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::{LocalId, Log};

/// Field criteria plus an allow-list of local IDs.
///
/// Each criterion names a field and the values it may take; a log matches
/// when every criterion is satisfied. Logs on the allow-list are always kept
/// locally, since they may not have reached the server yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    criteria: BTreeMap<String, Vec<String>>,
    local_ids: Vec<LocalId>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an accepted value for `field`. Repeating a field widens it.
    pub fn with_criterion(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria
            .entry(field.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_local_ids(mut self, local_ids: impl IntoIterator<Item = LocalId>) -> Self {
        self.local_ids.extend(local_ids);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty() && self.local_ids.is_empty()
    }

    pub fn local_ids(&self) -> &[LocalId] {
        &self.local_ids
    }

    pub fn matches(&self, log: &Log) -> bool {
        if self.local_ids.contains(&log.local_id()) {
            return true;
        }
        self.criteria.iter().all(|(field, accepted)| {
            field_text(log, field).is_some_and(|text| accepted.iter().any(|v| *v == text))
        })
    }

    /// `(field, value)` pairs for the server query string.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.criteria
            .iter()
            .flat_map(|(field, values)| values.iter().map(move |v| (field.clone(), v.clone())))
            .collect()
    }
}

/// Text form of a log attribute, for comparison with query values.
fn field_text(log: &Log, field: &str) -> Option<String> {
    match field {
        "name" => Some(log.name.clone()),
        "id" => log.id().map(str::to_string),
        _ => log.fields.get(field).map(value_text),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log(name: &str, log_type: &str, done: bool) -> Log {
        Log::new(LocalId::new(), name)
            .with_field("type", json!(log_type))
            .with_field("done", json!(done))
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = LogFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&log("a", "farm_seeding", false)));
    }

    #[test]
    fn test_all_criteria_must_match() {
        let filter = LogFilter::new()
            .with_criterion("type", "farm_seeding")
            .with_criterion("done", "0");

        assert!(filter.matches(&log("a", "farm_seeding", false)));
        assert!(!filter.matches(&log("b", "farm_seeding", true)));
        assert!(!filter.matches(&log("c", "farm_harvest", false)));
    }

    #[test]
    fn test_repeated_field_accepts_any() {
        let filter = LogFilter::new()
            .with_criterion("type", "farm_seeding")
            .with_criterion("type", "farm_harvest");

        assert!(filter.matches(&log("a", "farm_harvest", false)));
        assert!(!filter.matches(&log("b", "farm_input", false)));
    }

    #[test]
    fn test_allow_list_overrides_criteria() {
        let kept = log("draft", "farm_input", false);
        let filter = LogFilter::new()
            .with_criterion("type", "farm_seeding")
            .with_local_ids([kept.local_id()]);

        assert!(filter.matches(&kept));
        assert!(!filter.matches(&log("other", "farm_input", false)));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let filter = LogFilter::new().with_criterion("category", "5");
        assert!(!filter.matches(&log("a", "farm_seeding", false)));
    }

    #[test]
    fn test_name_and_id_criteria() {
        let remote = log("Harvest", "farm_harvest", true).with_remote_id("42");
        assert!(LogFilter::new().with_criterion("id", "42").matches(&remote));
        assert!(LogFilter::new().with_criterion("name", "Harvest").matches(&remote));
    }

    #[test]
    fn test_query_pairs() {
        let filter = LogFilter::new()
            .with_criterion("type", "farm_seeding")
            .with_criterion("type", "farm_harvest")
            .with_criterion("done", "1");

        assert_eq!(
            filter.query_pairs(),
            vec![
                ("done".to_string(), "1".to_string()),
                ("type".to_string(), "farm_seeding".to_string()),
                ("type".to_string(), "farm_harvest".to_string()),
            ]
        );
    }
}
