//! Local persistence and terminal collaborators for the sync engine.
//!
//! The whole record store lives in one JSON snapshot under the data
//! directory. Each command loads it, runs against the core engine and saves
//! it back:
//!
//! ```ignore
//! let client = FarmClient::open(&config)?;
//! client.lifecycle().create(NewLog::new("Irrigate"));
//! client.finish()?;
//! ```

pub mod client;
pub mod context;
pub mod storage;

pub use client::{FarmClient, FarmClientError};
