//! HTTP transport for a farmOS-style server.
//!
//! Endpoints:
//! - `GET  /log.json?<filter>`: logs, as one log or `{"list": [...]}`
//! - `POST /log`: create, answers `{"id", "uri"}`
//! - `PUT  /log/<id>`: update, body may be empty
//! - `GET  /taxonomy_term.json?bundle=farm_areas`: areas
//! - `GET  /farm_asset.json`: assets

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::context::Credential;
use super::error::TransportError;
use super::transport::FarmTransport;
use crate::filter::LogFilter;
use crate::models::{Area, Asset, ListResponse, LogPayload, OutboundLog, PushReceipt};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`FarmTransport`] over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network(e.to_string()))?;
        Ok(Self { client })
    }

    /// Builds an HTTP URL for a given path on `host`.
    fn build_url(host: &str, path: &str) -> String {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    async fn execute(request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, TransportError> {
        let request = self
            .client
            .get(Self::build_url(&credential.host, path))
            .bearer_auth(&credential.token)
            .query(query);

        Self::execute(request)
            .await?
            .json()
            .await
            .map_err(map_request_error)
    }

    /// Reads a create/update acknowledgement, tolerating an empty body.
    async fn receipt(response: Response) -> Result<PushReceipt, TransportError> {
        let body = response.text().await.map_err(map_request_error)?;
        if body.trim().is_empty() {
            return Ok(PushReceipt::default());
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Requests without a response are network failures; everything else that
/// goes wrong reading a response is a decode failure.
fn map_request_error(e: reqwest::Error) -> TransportError {
    if let Some(status) = e.status() {
        return TransportError::status(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        );
    }
    if e.is_decode() || e.is_body() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::network(e.to_string())
    }
}

#[async_trait]
impl FarmTransport for HttpTransport {
    async fn get_logs(
        &self,
        filter: &LogFilter,
        credential: &Credential,
    ) -> Result<LogPayload, TransportError> {
        self.get_json(credential, "/log.json", &filter.query_pairs())
            .await
    }

    async fn send_log(
        &self,
        log: &OutboundLog,
        credential: &Credential,
    ) -> Result<PushReceipt, TransportError> {
        let request = self
            .client
            .post(Self::build_url(&credential.host, "/log"))
            .bearer_auth(&credential.token)
            .json(log);

        Self::receipt(Self::execute(request).await?).await
    }

    async fn update_log(
        &self,
        log: &OutboundLog,
        credential: &Credential,
    ) -> Result<PushReceipt, TransportError> {
        let id = log.id.as_deref().unwrap_or_default();
        let request = self
            .client
            .put(Self::build_url(&credential.host, &format!("/log/{}", id)))
            .bearer_auth(&credential.token)
            .json(log);

        Self::receipt(Self::execute(request).await?).await
    }

    async fn get_areas(&self, credential: &Credential) -> Result<Vec<Area>, TransportError> {
        let query = [("bundle".to_string(), "farm_areas".to_string())];
        let response: ListResponse<Area> = self
            .get_json(credential, "/taxonomy_term.json", &query)
            .await?;
        Ok(response.list)
    }

    async fn get_assets(&self, credential: &Credential) -> Result<Vec<Asset>, TransportError> {
        let response: ListResponse<Asset> =
            self.get_json(credential, "/farm_asset.json", &[]).await?;
        Ok(response.list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        assert_eq!(
            HttpTransport::build_url("https://farm.example.com", "/log"),
            "https://farm.example.com/log"
        );
        assert_eq!(
            HttpTransport::build_url("http://localhost:8080/", "/log.json"),
            "http://localhost:8080/log.json"
        );
        assert_eq!(
            HttpTransport::build_url("farm.example.com", "/farm_asset.json"),
            "https://farm.example.com/farm_asset.json"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let transport = HttpTransport::new(Duration::from_millis(500)).unwrap();
        let credential = Credential {
            host: "http://127.0.0.1:1".to_string(),
            username: None,
            token: "token".to_string(),
        };

        let err = transport.get_assets(&credential).await.unwrap_err();

        assert!(matches!(err, TransportError::Network { .. }));
        assert_eq!(err.status_code(), None);
    }
}
