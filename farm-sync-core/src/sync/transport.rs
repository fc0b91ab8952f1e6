//! The boundary to the farm server.

use async_trait::async_trait;

use super::context::Credential;
use super::error::TransportError;
use crate::filter::LogFilter;
use crate::models::{Area, Asset, LogPayload, OutboundLog, PushReceipt};

/// Network access to the farm server.
///
/// Implementations are responsible for timeouts and must report them as
/// [`TransportError::Network`].
#[async_trait]
pub trait FarmTransport: Send + Sync {
    /// Logs matching `filter`.
    async fn get_logs(
        &self,
        filter: &LogFilter,
        credential: &Credential,
    ) -> Result<LogPayload, TransportError>;

    /// Creates a log the server has not seen.
    async fn send_log(
        &self,
        log: &OutboundLog,
        credential: &Credential,
    ) -> Result<PushReceipt, TransportError>;

    /// Updates a log the server already holds.
    async fn update_log(
        &self,
        log: &OutboundLog,
        credential: &Credential,
    ) -> Result<PushReceipt, TransportError>;

    async fn get_areas(&self, credential: &Credential) -> Result<Vec<Area>, TransportError>;

    async fn get_assets(&self, credential: &Credential) -> Result<Vec<Asset>, TransportError>;
}
