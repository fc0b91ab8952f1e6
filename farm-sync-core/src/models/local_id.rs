//! Client-generated log identifiers.
//!
//! A `LocalId` is assigned once when a log enters the local store and never
//! changes afterwards, regardless of whether the remote server later assigns
//! its own `id`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when parsing a local ID
#[derive(Error, Debug, PartialEq)]
pub enum LocalIdError {
    #[error("Invalid local ID '{0}': expected a UUID")]
    InvalidFormat(String),
}

/// Stable local identifier for a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(Uuid);

impl LocalId {
    /// Generate a new random local ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get as UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// First eight hex digits, used in terminal listings.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = LocalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| LocalIdError::InvalidFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        let a = LocalId::new();
        let b = LocalId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_display() {
        let id = LocalId::new();
        let parsed: LocalId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_invalid() {
        let err = "not-a-uuid".parse::<LocalId>().unwrap_err();
        assert_eq!(err, LocalIdError::InvalidFormat("not-a-uuid".to_string()));
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_short() {
        let id = LocalId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().replace('-', "").starts_with(&id.short()));
    }
}
