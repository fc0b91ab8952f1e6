//! Wires the core engine to the CLI's configuration and on-disk snapshot.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

use farm_sync_core::{
    DefaultLogFactory, FarmStore, FarmTransport, HttpTransport, LocalId, Log, LogFilter,
    LogLifecycle, PullReport, SyncContext, SyncEngine, SyncError, TransportError,
};

use super::context::{ConfigCredentials, FileSyncClock, TerminalNavigator, TerminalNotifier};
use super::storage::{SnapshotStorage, StorageError};
use crate::config::FarmConfig;

/// Errors that can occur setting up or persisting a session.
#[derive(Debug)]
pub enum FarmClientError {
    /// Snapshot could not be read or written
    StorageError(StorageError),
    /// HTTP client could not be built
    TransportError(TransportError),
    /// The engine asked the user to log in again
    ReauthRequired(String),
}

impl std::fmt::Display for FarmClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FarmClientError::StorageError(e) => write!(f, "Storage error: {}", e),
            FarmClientError::TransportError(e) => write!(f, "Transport error: {}", e),
            FarmClientError::ReauthRequired(route) => {
                write!(f, "Re-authentication required (redirected to {})", route)
            }
        }
    }
}

impl std::error::Error for FarmClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FarmClientError::StorageError(e) => Some(e),
            FarmClientError::TransportError(e) => Some(e),
            FarmClientError::ReauthRequired(_) => None,
        }
    }
}

impl From<StorageError> for FarmClientError {
    fn from(e: StorageError) -> Self {
        FarmClientError::StorageError(e)
    }
}

impl From<TransportError> for FarmClientError {
    fn from(e: TransportError) -> Self {
        FarmClientError::TransportError(e)
    }
}

/// One CLI session: the store loaded from disk and an engine around it.
pub struct FarmClient {
    engine: SyncEngine,
    storage: SnapshotStorage,
    clock: Arc<FileSyncClock>,
    navigator: Arc<TerminalNavigator>,
}

impl FarmClient {
    /// Loads the snapshot from the configured data directory.
    ///
    /// Works without a configured server; sync operations then fail with a
    /// login redirect.
    pub fn open(config: &FarmConfig) -> Result<Self, FarmClientError> {
        let transport = HttpTransport::new(config.farm.timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: &FarmConfig,
        transport: Arc<dyn FarmTransport>,
    ) -> Result<Self, FarmClientError> {
        let data_dir = config.data_dir.value.clone();
        let storage = SnapshotStorage::new(data_dir.clone());
        let store = FarmStore::from_snapshot(storage.load()?);
        tracing::debug!(
            path = %storage.path().display(),
            logs = store.logs().len(),
            "Loaded store snapshot"
        );

        let clock = Arc::new(FileSyncClock::new(data_dir));
        let navigator = Arc::new(TerminalNavigator::new());
        let context = SyncContext::new(
            Arc::new(ConfigCredentials::from_config(config)),
            navigator.clone(),
            Arc::new(TerminalNotifier),
            clock.clone(),
        );

        let lifecycle = LogLifecycle::new(store, Arc::new(DefaultLogFactory::new()));
        let engine = SyncEngine::new(lifecycle, transport, context);

        Ok(Self {
            engine,
            storage,
            clock,
            navigator,
        })
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn lifecycle(&self) -> &LogLifecycle {
        self.engine.lifecycle()
    }

    pub fn clock(&self) -> &FileSyncClock {
        &self.clock
    }

    /// Pulls with `filter` without dropping local logs from the snapshot.
    ///
    /// The engine narrows the in-memory collection to the filter; logs it
    /// removed are put back in their original order, followed by the logs the
    /// pull added.
    pub async fn pull(&self, filter: &LogFilter) -> Result<PullReport, SyncError> {
        let store = self.lifecycle().store();
        let before = store.logs();
        let result = self.engine.pull(filter).await;

        let restored = store
            .commit_logs::<_, Infallible>(|current| {
                let known: HashSet<LocalId> = before.iter().map(|log| log.local_id()).collect();
                let (kept, added): (Vec<&Log>, Vec<&Log>) = current
                    .iter()
                    .partition(|log| known.contains(&log.local_id()));

                let mut merged = before.to_vec();
                merged.extend(added.into_iter().cloned());
                Ok((merged, before.len() - kept.len()))
            })
            .unwrap_or_default();
        tracing::debug!(restored, "Restored logs outside the pull filter");

        result
    }

    /// Writes the current store back to disk.
    pub fn save(&self) -> Result<(), FarmClientError> {
        self.storage.save(&self.lifecycle().store().snapshot())?;
        Ok(())
    }

    /// Saves, then fails if the engine redirected to login during the run.
    pub fn finish(&self) -> Result<(), FarmClientError> {
        self.save()?;
        match self.navigator.requested_route() {
            Some(route) => Err(FarmClientError::ReauthRequired(route)),
            None => Ok(()),
        }
    }
}
