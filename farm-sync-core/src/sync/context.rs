//! Collaborators supplied by the host application.
//!
//! The engine never reads global state: credentials, navigation, user
//! notifications and the last-sync timestamp all arrive through a
//! [`SyncContext`] built by the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Route the navigator is sent to when the user must log in again.
pub const LOGIN_ROUTE: &str = "/login";

/// Server endpoint and bearer token for one session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub host: String,
    pub username: Option<String>,
    pub token: String,
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Read access to the stored login.
pub trait CredentialStore: Send + Sync {
    fn host(&self) -> Option<String>;
    fn username(&self) -> Option<String>;
    fn token(&self) -> Option<String>;

    /// A complete credential, or `None` when host or token is missing.
    fn credential(&self) -> Option<Credential> {
        Some(Credential {
            host: self.host()?,
            username: self.username(),
            token: self.token()?,
        })
    }
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Warning,
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWarning {
    pub message: String,
    pub error_code: String,
    pub level: WarningLevel,
}

impl UserWarning {
    pub fn new(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            level: WarningLevel::Warning,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn warn(&self, warning: UserWarning);
}

/// Persisted time of the last successful sync.
pub trait SyncClock: Send + Sync {
    fn record_sync(&self, at: DateTime<Utc>);
}

/// Everything the engine needs from its host.
#[derive(Clone)]
pub struct SyncContext {
    pub credentials: Arc<dyn CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn SyncClock>,
}

impl SyncContext {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn SyncClock>,
    ) -> Self {
        Self {
            credentials,
            navigator,
            notifier,
            clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        host: Option<&'static str>,
        token: Option<&'static str>,
    }

    impl CredentialStore for Fixed {
        fn host(&self) -> Option<String> {
            self.host.map(str::to_string)
        }

        fn username(&self) -> Option<String> {
            None
        }

        fn token(&self) -> Option<String> {
            self.token.map(str::to_string)
        }
    }

    #[test]
    fn test_credential_requires_host_and_token() {
        let full = Fixed {
            host: Some("https://farm.example.com"),
            token: Some("secret"),
        };
        assert_eq!(full.credential().unwrap().token, "secret");

        let no_token = Fixed {
            host: Some("https://farm.example.com"),
            token: None,
        };
        assert!(no_token.credential().is_none());

        let no_host = Fixed {
            host: None,
            token: Some("secret"),
        };
        assert!(no_host.credential().is_none());
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let credential = Credential {
            host: "https://farm.example.com".to_string(),
            username: Some("farmer".to_string()),
            token: "secret".to_string(),
        };
        let output = format!("{:?}", credential);
        assert!(!output.contains("secret"));
        assert!(output.contains("farmer"));
    }

    #[test]
    fn test_user_warning_level() {
        let warning = UserWarning::new("Unable to sync", "Not Found");
        assert_eq!(warning.level, WarningLevel::Warning);
        assert_eq!(warning.level.to_string(), "warning");
    }
}
