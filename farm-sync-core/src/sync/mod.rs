//! Synchronization with the farm server.
//!
//! The engine pulls logs from the server and pushes local edits back. All
//! network access goes through [`FarmTransport`]; credentials, navigation,
//! user warnings and the last-sync timestamp come from a [`SyncContext`].
//!
//! ## Failure handling
//!
//! Push failures are classified per log:
//! - no response at all: warn the user, keep going
//! - 401/403: send the user to the login route
//! - any other status: warn the user with the status text
//!
//! In every case the log is marked not ready to sync. Failures that fit none
//! of these (an unreadable response body) are returned to the caller.

mod classify;
mod context;
mod engine;
mod error;
mod http;
mod transport;

pub use classify::{classify, Classification, ErrorCategory, RecoveryAction};
pub use context::{
    Credential, CredentialStore, Navigator, Notifier, SyncClock, SyncContext, UserWarning,
    WarningLevel, LOGIN_ROUTE,
};
pub use engine::{settle_all, PullReport, PushOutcome, PushTask, SyncEngine, SyncReport};
pub use error::{SyncError, TransportError};
pub use http::{HttpTransport, DEFAULT_TIMEOUT};
pub use transport::FarmTransport;
