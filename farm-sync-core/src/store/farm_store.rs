//! The process-wide record store.
//!
//! Each collection is held as an `Arc<Vec<_>>` snapshot. A commit builds a new
//! vector and swaps it in while holding the write lock, so a reader always
//! sees a whole snapshot. The lock is never held across an `.await`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::entity::{upsert, upsert_one};
use crate::models::{Area, Asset, Category, Log, Unit};

/// Names one of the store's collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Logs,
    Assets,
    Areas,
    Units,
    Categories,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Logs => write!(f, "logs"),
            EntityKind::Assets => write!(f, "assets"),
            EntityKind::Areas => write!(f, "areas"),
            EntityKind::Units => write!(f, "units"),
            EntityKind::Categories => write!(f, "categories"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logs" => Ok(EntityKind::Logs),
            "assets" => Ok(EntityKind::Assets),
            "areas" => Ok(EntityKind::Areas),
            "units" => Ok(EntityKind::Units),
            "categories" => Ok(EntityKind::Categories),
            _ => Err(format!(
                "Invalid collection '{}'. Valid options: logs, assets, areas, units, categories",
                s
            )),
        }
    }
}

/// Plain-data copy of every collection, used for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub logs: Vec<Log>,
    pub assets: Vec<Asset>,
    pub areas: Vec<Area>,
    pub units: Vec<Unit>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Default)]
struct Collections {
    logs: Arc<Vec<Log>>,
    assets: Arc<Vec<Asset>>,
    areas: Arc<Vec<Area>>,
    units: Arc<Vec<Unit>>,
    categories: Arc<Vec<Category>>,
}

/// Shared handle to the record collections. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct FarmStore {
    inner: Arc<RwLock<Collections>>,
}

impl FarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        store.restore(snapshot);
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ========== Snapshots ==========

    pub fn logs(&self) -> Arc<Vec<Log>> {
        Arc::clone(&self.read().logs)
    }

    pub fn assets(&self) -> Arc<Vec<Asset>> {
        Arc::clone(&self.read().assets)
    }

    pub fn areas(&self) -> Arc<Vec<Area>> {
        Arc::clone(&self.read().areas)
    }

    pub fn units(&self) -> Arc<Vec<Unit>> {
        Arc::clone(&self.read().units)
    }

    pub fn categories(&self) -> Arc<Vec<Category>> {
        Arc::clone(&self.read().categories)
    }

    /// Assets whose type is `equipment`.
    pub fn equipment(&self) -> Vec<Asset> {
        self.assets()
            .iter()
            .filter(|asset| asset.is_equipment())
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let guard = self.read();
        StoreSnapshot {
            logs: guard.logs.to_vec(),
            assets: guard.assets.to_vec(),
            areas: guard.areas.to_vec(),
            units: guard.units.to_vec(),
            categories: guard.categories.to_vec(),
        }
    }

    /// Replaces every collection with the snapshot's contents.
    pub fn restore(&self, snapshot: StoreSnapshot) {
        let mut guard = self.write();
        guard.logs = Arc::new(snapshot.logs);
        guard.assets = Arc::new(snapshot.assets);
        guard.areas = Arc::new(snapshot.areas);
        guard.units = Arc::new(snapshot.units);
        guard.categories = Arc::new(snapshot.categories);
    }

    // ========== Commits ==========

    pub fn add_log(&self, log: Log) {
        let mut guard = self.write();
        guard.logs = Arc::new(upsert_one(&guard.logs, log));
    }

    pub fn add_logs(&self, logs: Vec<Log>) {
        let mut guard = self.write();
        guard.logs = Arc::new(upsert(&guard.logs, logs));
    }

    pub fn add_assets(&self, assets: Vec<Asset>) {
        let mut guard = self.write();
        guard.assets = Arc::new(upsert(&guard.assets, assets));
    }

    pub fn add_areas(&self, areas: Vec<Area>) {
        let mut guard = self.write();
        guard.areas = Arc::new(upsert(&guard.areas, areas));
    }

    pub fn add_units(&self, units: Vec<Unit>) {
        let mut guard = self.write();
        guard.units = Arc::new(upsert(&guard.units, units));
    }

    pub fn add_categories(&self, categories: Vec<Category>) {
        let mut guard = self.write();
        guard.categories = Arc::new(upsert(&guard.categories, categories));
    }

    /// Clears the assets and inserts `assets` in a single commit.
    pub fn replace_assets(&self, assets: Vec<Asset>) {
        let mut guard = self.write();
        guard.assets = Arc::new(upsert(&[], assets));
    }

    /// Clears the areas and inserts `areas` in a single commit.
    pub fn replace_areas(&self, areas: Vec<Area>) {
        let mut guard = self.write();
        guard.areas = Arc::new(upsert(&[], areas));
    }

    /// Read-modify-replace of the log collection as one step.
    ///
    /// `f` sees the current logs and returns the replacement collection plus
    /// a value for the caller. On `Err` nothing is committed.
    pub fn commit_logs<R, E>(
        &self,
        f: impl FnOnce(&[Log]) -> Result<(Vec<Log>, R), E>,
    ) -> Result<R, E> {
        let mut guard = self.write();
        let (logs, value) = f(&guard.logs)?;
        guard.logs = Arc::new(logs);
        Ok(value)
    }

    pub fn clear(&self, kind: EntityKind) {
        let mut guard = self.write();
        match kind {
            EntityKind::Logs => guard.logs = Arc::default(),
            EntityKind::Assets => guard.assets = Arc::default(),
            EntityKind::Areas => guard.areas = Arc::default(),
            EntityKind::Units => guard.units = Arc::default(),
            EntityKind::Categories => guard.categories = Arc::default(),
        }
    }
}
