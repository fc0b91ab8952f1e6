//! Pull/push synchronization with the farm server.
//!
//! ## Pull
//!
//! 1. Narrow the local log collection with the filter
//! 2. Fetch matching logs from the server
//! 3. Store logs the device has never seen, with their assets and areas
//!    resolved against the local cache. Logs already held locally are left
//!    alone, whether or not they carry unpushed edits.
//! 4. Record the sync time
//!
//! ## Push
//!
//! One Tokio task per requested log. Logs with a remote id are updated, the
//! rest are created. Each task commits its own outcome: success marks the
//! log pushed, a classified failure marks it not ready to sync. Tasks share
//! nothing, so one failing never affects another.

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::classify::{classify, ErrorCategory, RecoveryAction};
use super::context::{Credential, SyncContext, LOGIN_ROUTE};
use super::error::SyncError;
use super::transport::FarmTransport;
use crate::attach::resolve;
use crate::filter::LogFilter;
use crate::lifecycle::LogLifecycle;
use crate::models::{LocalId, Log, NewLog, OutboundLog, RemoteLog};

/// Counts from the reconcile step of a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Logs returned by the server
    pub fetched: usize,
    /// Logs stored for the first time
    pub added: usize,
    /// Logs already held and already pushed
    pub already_synced: usize,
    /// Logs held with unpushed local edits
    pub kept_local: usize,
}

/// How one push task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed {
        local_id: LocalId,
        id: Option<String>,
        remote_uri: Option<String>,
    },
    /// The failure was classified and recovered from.
    Failed {
        local_id: LocalId,
        category: ErrorCategory,
    },
}

impl PushOutcome {
    pub fn local_id(&self) -> LocalId {
        match self {
            PushOutcome::Pushed { local_id, .. } | PushOutcome::Failed { local_id, .. } => {
                *local_id
            }
        }
    }

    pub fn is_pushed(&self) -> bool {
        matches!(self, PushOutcome::Pushed { .. })
    }
}

/// Handle to one in-flight push.
///
/// The push runs to completion whether or not the handle is awaited.
#[derive(Debug)]
pub struct PushTask {
    index: usize,
    local_id: LocalId,
    handle: JoinHandle<Result<PushOutcome, SyncError>>,
}

impl PushTask {
    /// Position of the log in the collection when the push was requested.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn local_id(&self) -> LocalId {
        self.local_id
    }

    pub async fn wait(self) -> Result<PushOutcome, SyncError> {
        self.handle
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }
}

/// Waits for every task, returning results in task order.
pub async fn settle_all(tasks: Vec<PushTask>) -> Vec<Result<PushOutcome, SyncError>> {
    join_all(tasks.into_iter().map(PushTask::wait)).await
}

/// Result of a full pull-then-push cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pull: PullReport,
    pub push: Vec<PushOutcome>,
}

/// Where a fetched log stands relative to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteStatus {
    New,
    Synced(LocalId),
    Dirty(LocalId),
}

fn remote_status(logs: &[Log], remote_id: &str) -> RemoteStatus {
    match logs.iter().find(|log| log.id() == Some(remote_id)) {
        None => RemoteStatus::New,
        Some(log) if log.was_pushed_to_server => RemoteStatus::Synced(log.local_id()),
        Some(log) => RemoteStatus::Dirty(log.local_id()),
    }
}

/// Drives pull and push against a [`FarmTransport`].
#[derive(Clone)]
pub struct SyncEngine {
    lifecycle: LogLifecycle,
    transport: Arc<dyn FarmTransport>,
    context: SyncContext,
}

impl SyncEngine {
    pub fn new(
        lifecycle: LogLifecycle,
        transport: Arc<dyn FarmTransport>,
        context: SyncContext,
    ) -> Self {
        Self {
            lifecycle,
            transport,
            context,
        }
    }

    pub fn lifecycle(&self) -> &LogLifecycle {
        &self.lifecycle
    }

    /// Indices of logs with local edits that are still eligible for sync.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.lifecycle
            .store()
            .logs()
            .iter()
            .enumerate()
            .filter(|(_, log)| !log.was_pushed_to_server && log.is_ready_to_sync)
            .map(|(index, _)| index)
            .collect()
    }

    fn require_credential(&self) -> Result<Credential, SyncError> {
        match self.context.credentials.credential() {
            Some(credential) => Ok(credential),
            None => {
                tracing::warn!("No credential available, redirecting to login");
                self.context.navigator.navigate_to(LOGIN_ROUTE);
                Err(SyncError::MissingCredential)
            }
        }
    }

    fn record_sync(&self) {
        let now = Utc::now();
        self.context.clock.record_sync(now);
        tracing::info!(at = now.timestamp(), "Recorded sync time");
    }

    // ========== Pull ==========

    /// Filters local logs, fetches matching logs and stores the new ones.
    ///
    /// Without a credential the store is left untouched.
    pub async fn pull(&self, filter: &LogFilter) -> Result<PullReport, SyncError> {
        let credential = self.require_credential()?;
        self.lifecycle.filter(|log| filter.matches(log));

        let report = self.fetch_and_reconcile(filter, &credential).await?;
        self.record_sync();

        Ok(report)
    }

    async fn fetch_and_reconcile(
        &self,
        filter: &LogFilter,
        credential: &Credential,
    ) -> Result<PullReport, SyncError> {
        tracing::info!(query = ?filter.query_pairs(), "Fetching logs from server");
        let remote_logs = self.transport.get_logs(filter, credential).await?.into_logs();

        let mut report = PullReport {
            fetched: remote_logs.len(),
            ..PullReport::default()
        };
        for remote in remote_logs {
            match self.reconcile(remote) {
                RemoteStatus::New => report.added += 1,
                RemoteStatus::Synced(_) => report.already_synced += 1,
                RemoteStatus::Dirty(_) => report.kept_local += 1,
            }
        }

        tracing::info!(
            fetched = report.fetched,
            added = report.added,
            kept_local = report.kept_local,
            "Finished pulling logs"
        );
        Ok(report)
    }

    /// Stores `remote` if no local log carries its id yet.
    ///
    /// Logs are reconciled one at a time against the current store, so a
    /// batch that repeats an id stores it once.
    fn reconcile(&self, remote: RemoteLog) -> RemoteStatus {
        let store = self.lifecycle.store();
        let status = remote_status(&store.logs(), &remote.id);

        match status {
            RemoteStatus::New => {
                let attachments = resolve(&remote, &store.assets(), &store.areas());
                let RemoteLog {
                    id, name, fields, ..
                } = remote;
                let remote_id = id.clone();
                let local_id = self.lifecycle.store_from_server(
                    NewLog::new(name)
                        .with_remote_id(id)
                        .with_fields(fields)
                        .with_attachments(attachments.assets, attachments.areas),
                );
                tracing::debug!(%remote_id, %local_id, "Stored new log from server");
            }
            RemoteStatus::Synced(local_id) => {
                // Not overwritten: the server copy is assumed to match what was pushed.
                tracing::debug!(remote_id = %remote.id, %local_id, "Log already synced");
            }
            RemoteStatus::Dirty(local_id) => {
                tracing::info!(
                    remote_id = %remote.id,
                    %local_id,
                    "Log {} has been changed locally, keeping local edits",
                    remote.name
                );
            }
        }

        status
    }

    // ========== Push ==========

    /// Starts one push task per index and returns their handles.
    ///
    /// Fails before any request when no credential is available. Indices
    /// past the end of the collection are skipped. Must be called from within
    /// a Tokio runtime.
    pub fn push(&self, indices: &[usize]) -> Result<Vec<PushTask>, SyncError> {
        let credential = self.require_credential()?;
        let logs = self.lifecycle.store().logs();

        let mut tasks = Vec::with_capacity(indices.len());
        for &index in indices {
            let Some(log) = logs.get(index) else {
                tracing::warn!(index, "No log at index, skipping push");
                continue;
            };

            let outbound = self.lifecycle.factory().to_server(log);
            let name = log.name.clone();
            let local_id = log.local_id();
            tracing::debug!(index, %local_id, update = outbound.id.is_some(), "Sending log");

            let engine = self.clone();
            let credential = credential.clone();
            let handle =
                tokio::spawn(async move { engine.push_one(outbound, name, credential).await });

            tasks.push(PushTask {
                index,
                local_id,
                handle,
            });
        }

        Ok(tasks)
    }

    async fn push_one(
        &self,
        outbound: OutboundLog,
        name: String,
        credential: Credential,
    ) -> Result<PushOutcome, SyncError> {
        let local_id = outbound.local_id;
        let result = match outbound.id {
            Some(_) => self.transport.update_log(&outbound, &credential).await,
            None => self.transport.send_log(&outbound, &credential).await,
        };

        match result {
            Ok(receipt) => {
                let log = self.lifecycle.mark_pushed(local_id, receipt.id, receipt.uri)?;
                tracing::info!(%local_id, id = ?log.id(), "Pushed log {}", name);
                Ok(PushOutcome::Pushed {
                    local_id,
                    id: log.id().map(str::to_string),
                    remote_uri: log.remote_uri,
                })
            }
            Err(error) => {
                let Some(classification) = classify(&error, &name) else {
                    tracing::error!(%local_id, error = %error, "Unrecognized push failure");
                    return Err(error.into());
                };

                tracing::warn!(
                    %local_id,
                    category = %classification.category,
                    error = %error,
                    "Push failed"
                );
                match classification.action {
                    RecoveryAction::Warn(warning) => self.context.notifier.warn(warning),
                    RecoveryAction::Navigate(route) => self.context.navigator.navigate_to(route),
                }
                self.lifecycle.mark_not_ready(local_id)?;

                Ok(PushOutcome::Failed {
                    local_id,
                    category: classification.category,
                })
            }
        }
    }

    // ========== Full cycle ==========

    /// Pulls, pushes `indices`, waits for every push and records the sync
    /// time.
    ///
    /// The local collection is not filtered so that `indices` keep pointing
    /// at the logs the caller meant. If any push ends in an unrecognized
    /// failure, the first such error is returned once all tasks have settled
    /// and no sync time is recorded.
    pub async fn sync(
        &self,
        filter: &LogFilter,
        indices: &[usize],
    ) -> Result<SyncReport, SyncError> {
        let credential = self.require_credential()?;
        let pull = self.fetch_and_reconcile(filter, &credential).await?;

        let mut push = Vec::with_capacity(indices.len());
        let mut first_error = None;
        for result in settle_all(self.push(indices)?).await {
            match result {
                Ok(outcome) => push.push(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "Push task ended with an error");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        self.record_sync();
        Ok(SyncReport { pull, push })
    }

    // ========== Reference data ==========

    /// Replaces the local areas with the server's.
    pub async fn refresh_areas(&self) -> Result<usize, SyncError> {
        let credential = self.require_credential()?;
        let areas = self.transport.get_areas(&credential).await?;
        let count = areas.len();
        self.lifecycle.store().replace_areas(areas);
        tracing::info!(count, "Finished updating areas");
        Ok(count)
    }

    /// Replaces the local assets with the server's.
    pub async fn refresh_assets(&self) -> Result<usize, SyncError> {
        let credential = self.require_credential()?;
        let assets = self.transport.get_assets(&credential).await?;
        let count = assets.len();
        self.lifecycle.store().replace_assets(assets);
        tracing::info!(count, "Finished updating assets");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status() {
        let synced = Log::new(LocalId::new(), "a")
            .with_remote_id("1")
            .with_pushed(true);
        let dirty = Log::new(LocalId::new(), "b").with_remote_id("2");
        let draft = Log::new(LocalId::new(), "c");
        let logs = vec![synced.clone(), dirty.clone(), draft];

        assert_eq!(
            remote_status(&logs, "1"),
            RemoteStatus::Synced(synced.local_id())
        );
        assert_eq!(
            remote_status(&logs, "2"),
            RemoteStatus::Dirty(dirty.local_id())
        );
        assert_eq!(remote_status(&logs, "3"), RemoteStatus::New);
    }

    #[test]
    fn test_push_outcome_accessors() {
        let local_id = LocalId::new();
        let pushed = PushOutcome::Pushed {
            local_id,
            id: Some("42".to_string()),
            remote_uri: None,
        };
        let failed = PushOutcome::Failed {
            local_id,
            category: ErrorCategory::RemoteError,
        };
        assert!(pushed.is_pushed());
        assert!(!failed.is_pushed());
        assert_eq!(failed.local_id(), local_id);
    }
}
