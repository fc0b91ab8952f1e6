//! Mapping push failures to recovery actions.

use std::fmt;

use super::context::{UserWarning, LOGIN_ROUTE};
use super::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NetworkUnavailable,
    AuthFailure,
    RemoteError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::NetworkUnavailable => write!(f, "network unavailable"),
            ErrorCategory::AuthFailure => write!(f, "authentication failure"),
            ErrorCategory::RemoteError => write!(f, "remote error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Show the user a warning and carry on.
    Warn(UserWarning),
    /// Send the user to the given route.
    Navigate(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub action: RecoveryAction,
}

impl Classification {
    pub fn user_message(&self) -> Option<&str> {
        match &self.action {
            RecoveryAction::Warn(warning) => Some(&warning.message),
            RecoveryAction::Navigate(_) => None,
        }
    }
}

/// Classifies a failed push of the log named `record_name`.
///
/// Returns `None` for failures that are neither network- nor status-related;
/// those are handed back to the caller unrecovered.
pub fn classify(error: &TransportError, record_name: &str) -> Option<Classification> {
    match error {
        TransportError::Network { status_text } => Some(Classification {
            category: ErrorCategory::NetworkUnavailable,
            action: RecoveryAction::Warn(UserWarning::new(
                format!(
                    "Unable to sync \"{}\" because the network is currently unavailable. \
                     Please try syncing again later.",
                    record_name
                ),
                status_text.clone(),
            )),
        }),
        TransportError::Status { status: 401 | 403, .. } => Some(Classification {
            category: ErrorCategory::AuthFailure,
            action: RecoveryAction::Navigate(LOGIN_ROUTE),
        }),
        TransportError::Status {
            status,
            status_text,
        } => Some(Classification {
            category: ErrorCategory::RemoteError,
            action: RecoveryAction::Warn(UserWarning::new(
                format!(
                    "{} error while syncing \"{}\": {}",
                    status, record_name, status_text
                ),
                status_text.clone(),
            )),
        }),
        TransportError::Decode(_) => None,
    }
}
