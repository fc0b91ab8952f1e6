//! Terminal and filesystem implementations of the engine's collaborators.

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use farm_sync_core::{CredentialStore, Navigator, Notifier, SyncClock, UserWarning};

use crate::config::FarmConfig;

const SYNC_DATE_FILE: &str = "sync_date";

/// Login details taken from the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigCredentials {
    host: Option<String>,
    username: Option<String>,
    token: Option<String>,
}

impl ConfigCredentials {
    pub fn from_config(config: &FarmConfig) -> Self {
        Self {
            host: config.farm.host.clone(),
            username: config.farm.username.clone(),
            token: config.farm.token.clone(),
        }
    }
}

impl CredentialStore for ConfigCredentials {
    fn host(&self) -> Option<String> {
        self.host.clone()
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }

    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Keeps the last sync time as epoch seconds in `<data_dir>/sync_date`.
#[derive(Debug, Clone)]
pub struct FileSyncClock {
    path: PathBuf,
}

impl FileSyncClock {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(SYNC_DATE_FILE),
        }
    }

    /// Time of the last recorded sync, if any.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let secs: i64 = contents.trim().parse().ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

impl SyncClock for FileSyncClock {
    fn record_sync(&self, at: DateTime<Utc>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!("Failed to create {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, at.timestamp().to_string()) {
            tracing::warn!("Failed to write {}: {}", self.path.display(), e);
        }
    }
}

/// Prints a login hint and remembers where the engine asked to go.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    requested: Mutex<Option<String>>,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route requested during this run, if any.
    pub fn requested_route(&self) -> Option<String> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for TerminalNavigator {
    fn navigate_to(&self, route: &str) {
        let mut requested = self.requested.lock().unwrap_or_else(|e| e.into_inner());
        // Several push tasks can fail auth at once; tell the user once.
        if requested.is_none() {
            eprintln!(
                "Authentication required ({}). Set farm.host and farm.token in your config \
                 or FARM_HOST / FARM_TOKEN.",
                route
            );
        }
        *requested = Some(route.to_string());
    }
}

/// Prints warnings to stderr.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn warn(&self, warning: UserWarning) {
        eprintln!("{}: {}", warning.level, warning.message);
    }
}
