//! Record-level log operations.
//!
//! All writes to the log collection go through here so that the sync flags
//! are maintained consistently: a local update marks the log dirty, and only
//! the sync engine marks it pushed.

use std::sync::Arc;
use thiserror::Error;

use crate::factory::{LogFactory, LogOrigin};
use crate::models::{LocalId, Log, LogPatch, NewLog};
use crate::store::{EntityKind, FarmStore};

/// Errors from log lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Log not found: {0}")]
    NotFound(LocalId),
}

/// Create/update/delete operations over the shared store.
#[derive(Clone)]
pub struct LogLifecycle {
    store: FarmStore,
    factory: Arc<dyn LogFactory>,
}

impl LogLifecycle {
    pub fn new(store: FarmStore, factory: Arc<dyn LogFactory>) -> Self {
        Self { store, factory }
    }

    pub fn store(&self) -> &FarmStore {
        &self.store
    }

    pub fn factory(&self) -> &dyn LogFactory {
        self.factory.as_ref()
    }

    /// Creates a log and returns its fresh local ID.
    ///
    /// A `new_log` carrying a remote `id` keeps it; the log is still built as
    /// a local creation and so starts out unpushed.
    pub fn create(&self, new_log: NewLog) -> LocalId {
        self.insert(new_log, LogOrigin::LocalCreate)
    }

    /// Stores a log fetched from the server under a fresh local ID.
    pub fn store_from_server(&self, new_log: NewLog) -> LocalId {
        self.insert(new_log, LogOrigin::StoreFromServer)
    }

    fn insert(&self, new_log: NewLog, origin: LogOrigin) -> LocalId {
        let local_id = LocalId::new();
        let log = self.factory.build(local_id, new_log, origin);
        self.store.add_log(log);
        tracing::debug!(%local_id, ?origin, "Log created");
        local_id
    }

    pub fn get(&self, local_id: LocalId) -> Option<Log> {
        self.store
            .logs()
            .iter()
            .find(|log| log.local_id() == local_id)
            .cloned()
    }

    /// Applies a local edit and marks the log as not pushed.
    ///
    /// The patch may set `was_pushed_to_server` itself, in which case that
    /// value is kept.
    pub fn update(&self, local_id: LocalId, patch: LogPatch) -> Result<Log, LifecycleError> {
        let patch = LogPatch {
            was_pushed_to_server: patch.was_pushed_to_server.or(Some(false)),
            ..patch
        };
        self.replace(local_id, |log| log.apply(patch))
    }

    /// Records a successful push. An id already held locally is kept over
    /// the one the server returned.
    pub(crate) fn mark_pushed(
        &self,
        local_id: LocalId,
        server_id: Option<String>,
        remote_uri: Option<String>,
    ) -> Result<Log, LifecycleError> {
        self.replace(local_id, |log| {
            let id = log.id().map(str::to_string).or(server_id);
            log.apply(LogPatch {
                id,
                remote_uri,
                was_pushed_to_server: Some(true),
                ..LogPatch::default()
            })
        })
    }

    /// Excludes a log from automatic sync after a failed push.
    pub(crate) fn mark_not_ready(&self, local_id: LocalId) -> Result<Log, LifecycleError> {
        self.replace(local_id, |log| {
            log.apply(LogPatch::new().with_ready_to_sync(false))
        })
    }

    /// Replaces the log with `local_id` at its current position.
    fn replace(
        &self,
        local_id: LocalId,
        f: impl FnOnce(Log) -> Log,
    ) -> Result<Log, LifecycleError> {
        self.store.commit_logs(|logs| {
            let index = logs
                .iter()
                .position(|log| log.local_id() == local_id)
                .ok_or(LifecycleError::NotFound(local_id))?;
            let updated = f(logs[index].clone());
            let mut next = logs.to_vec();
            next[index] = updated.clone();
            Ok((next, updated))
        })
    }

    /// Removes the first log with `local_id`.
    pub fn delete(&self, local_id: LocalId) -> Result<Log, LifecycleError> {
        self.store.commit_logs(|logs| {
            let index = logs
                .iter()
                .position(|log| log.local_id() == local_id)
                .ok_or(LifecycleError::NotFound(local_id))?;
            let mut next = logs.to_vec();
            let removed = next.remove(index);
            Ok((next, removed))
        })
    }

    /// Keeps only the logs matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&Log) -> bool) {
        let removed = self
            .store
            .commit_logs::<_, std::convert::Infallible>(|logs| {
                let kept: Vec<Log> = logs.iter().filter(|log| predicate(log)).cloned().collect();
                let removed = logs.len() - kept.len();
                Ok((kept, removed))
            })
            .unwrap_or_default();
        tracing::debug!(removed, "Filtered logs");
    }

    /// Empties one collection of the store.
    pub fn clear_all(&self, kind: EntityKind) {
        self.store.clear(kind);
        tracing::debug!(%kind, "Cleared collection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DefaultLogFactory;
    use crate::models::Asset;
    use serde_json::json;

    fn lifecycle() -> LogLifecycle {
        LogLifecycle::new(FarmStore::new(), Arc::new(DefaultLogFactory::new()))
    }

    #[test]
    fn test_create_draft() {
        let lifecycle = lifecycle();
        let l1 = lifecycle.create(NewLog::new("Irrigate field A"));

        let logs = lifecycle.store().logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].local_id(), l1);
        assert_eq!(logs[0].name, "Irrigate field A");
        assert!(!logs[0].was_pushed_to_server);
        assert!(logs[0].id().is_none());
    }

    #[test]
    fn test_create_with_remote_id_keeps_it() {
        let lifecycle = lifecycle();
        let local_id = lifecycle.create(NewLog::new("From elsewhere").with_remote_id("12"));

        let log = lifecycle.get(local_id).unwrap();
        assert_eq!(log.id(), Some("12"));
        assert_eq!(log.log_type(), Some("farm_activity"));
    }

    #[test]
    fn test_create_generates_distinct_ids() {
        let lifecycle = lifecycle();
        let a = lifecycle.create(NewLog::new("a"));
        let b = lifecycle.create(NewLog::new("a"));
        assert_ne!(a, b);
        assert_eq!(lifecycle.store().logs().len(), 2);
    }

    #[test]
    fn test_update_resets_pushed_flag() {
        let lifecycle = lifecycle();
        let local_id = lifecycle.store_from_server(NewLog::new("Harvest").with_remote_id("5"));
        assert!(lifecycle.get(local_id).unwrap().was_pushed_to_server);

        let updated = lifecycle
            .update(local_id, LogPatch::new().with_field("notes", json!("2 crates")))
            .unwrap();

        assert!(!updated.was_pushed_to_server);
        assert_eq!(updated.fields.get("notes"), Some(&json!("2 crates")));
        assert_eq!(updated.id(), Some("5"));
    }

    #[test]
    fn test_update_honours_explicit_pushed_flag() {
        let lifecycle = lifecycle();
        let local_id = lifecycle.create(NewLog::new("a"));

        let updated = lifecycle
            .update(local_id, LogPatch::new().with_name("b").with_pushed(true))
            .unwrap();

        assert!(updated.was_pushed_to_server);
        assert_eq!(updated.name, "b");
    }

    #[test]
    fn test_update_keeps_position() {
        let lifecycle = lifecycle();
        let first = lifecycle.create(NewLog::new("first"));
        let second = lifecycle.create(NewLog::new("second"));
        lifecycle.create(NewLog::new("third"));

        lifecycle
            .update(second, LogPatch::new().with_name("second, edited"))
            .unwrap();

        let logs = lifecycle.store().logs();
        assert_eq!(logs[0].local_id(), first);
        assert_eq!(logs[1].local_id(), second);
        assert_eq!(logs[1].name, "second, edited");
    }

    #[test]
    fn test_update_missing() {
        let lifecycle = lifecycle();
        let missing = LocalId::new();
        let err = lifecycle.update(missing, LogPatch::new()).unwrap_err();
        assert_eq!(err, LifecycleError::NotFound(missing));
    }

    #[test]
    fn test_mark_pushed_prefers_local_id() {
        let lifecycle = lifecycle();
        let local_id = lifecycle.create(NewLog::new("a").with_remote_id("12"));

        let log = lifecycle
            .mark_pushed(local_id, Some("99".to_string()), Some("/log/12".to_string()))
            .unwrap();

        assert_eq!(log.id(), Some("12"));
        assert_eq!(log.remote_uri.as_deref(), Some("/log/12"));
        assert!(log.was_pushed_to_server);
    }

    #[test]
    fn test_mark_not_ready_keeps_sync_state() {
        let lifecycle = lifecycle();
        let local_id = lifecycle.store_from_server(NewLog::new("a").with_remote_id("1"));

        let log = lifecycle.mark_not_ready(local_id).unwrap();

        assert!(!log.is_ready_to_sync);
        assert!(log.was_pushed_to_server);
        assert_eq!(log.id(), Some("1"));
    }

    #[test]
    fn test_delete() {
        let lifecycle = lifecycle();
        let keep = lifecycle.create(NewLog::new("keep"));
        let gone = lifecycle.create(NewLog::new("gone"));

        let removed = lifecycle.delete(gone).unwrap();

        assert_eq!(removed.local_id(), gone);
        let logs = lifecycle.store().logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].local_id(), keep);
    }

    #[test]
    fn test_delete_missing_leaves_store_untouched() {
        let lifecycle = lifecycle();
        lifecycle.create(NewLog::new("keep"));

        assert!(lifecycle.delete(LocalId::new()).is_err());
        assert_eq!(lifecycle.store().logs().len(), 1);
    }

    #[test]
    fn test_filter() {
        let lifecycle = lifecycle();
        lifecycle.create(NewLog::new("Seed").with_field("type", json!("farm_seeding")));
        lifecycle.create(NewLog::new("Harvest").with_field("type", json!("farm_harvest")));

        lifecycle.filter(|log| log.log_type() == Some("farm_harvest"));

        let logs = lifecycle.store().logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].name, "Harvest");
    }

    #[test]
    fn test_clear_all() {
        let lifecycle = lifecycle();
        lifecycle.create(NewLog::new("a"));
        lifecycle
            .store()
            .add_assets(vec![Asset::new("7", "Tractor")]);

        lifecycle.clear_all(EntityKind::Logs);

        assert!(lifecycle.store().logs().is_empty());
        assert_eq!(lifecycle.store().assets().len(), 1);
    }
}
