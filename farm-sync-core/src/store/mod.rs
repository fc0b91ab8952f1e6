//! Local record store.
//!
//! `entity` holds the keyed upsert used by every collection; `farm_store`
//! holds the shared, copy-on-write collections themselves.

mod entity;
mod farm_store;

pub use entity::{upsert, upsert_by, upsert_one, Keyed};
pub use farm_store::{EntityKind, FarmStore, StoreSnapshot};
