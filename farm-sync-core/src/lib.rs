//! Farm Sync Core Library
//!
//! Offline-first storage for farm field logs and their reference data, and
//! the pull/push engine that keeps them in step with a farm server.

pub mod attach;
pub mod factory;
pub mod filter;
pub mod lifecycle;
pub mod models;
pub mod store;
pub mod sync;

pub use attach::{resolve, Attachments};
pub use factory::{DefaultLogFactory, LogFactory, LogOrigin};
pub use filter::LogFilter;
pub use lifecycle::{LifecycleError, LogLifecycle};
pub use models::{
    Area, Asset, Category, Fields, LocalId, LocalIdError, Log, LogPatch, NewLog, OutboundLog,
    PushReceipt, RemoteLog, ResourceRef, Unit,
};
pub use store::{EntityKind, FarmStore, Keyed, StoreSnapshot};
pub use sync::{
    Credential, CredentialStore, FarmTransport, HttpTransport, Navigator, Notifier, PullReport,
    PushOutcome, PushTask, SyncClock, SyncContext, SyncEngine, SyncError, SyncReport,
    TransportError, UserWarning,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
