use super::messages::{ApiKeys, ApiKeysResponse, AvailableFeatures, SessionCreated, SessionStatus};
use super::socket::{self, SocketHandle};
use crate::config::BackendConfig;
use crate::controller::{ConnId, EventSender};
use anyhow::{Context, Result};
use tracing::info;

/// The assistant backend as seen by the runtime
///
/// Implementations:
/// - `HttpBackend`: reqwest for the session endpoints, WebSocket for the session socket
/// - test doubles that hand out in-memory sockets
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// GET /session returns a fresh session id
    async fn create_session(&self) -> Result<String>;

    /// GET /session/{id}/status
    async fn session_status(&self, session_id: &str) -> Result<AvailableFeatures>;

    /// POST /session/{id}/api-keys returns the names of the keys the backend accepted
    async fn configure_api_keys(&self, session_id: &str, keys: &ApiKeys) -> Result<Vec<String>>;

    /// Open the session socket; inbound frames are posted to `events` tagged with `conn_id`
    async fn connect(
        &self,
        session_id: &str,
        conn_id: ConnId,
        events: EventSender,
    ) -> Result<SocketHandle>;
}

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn create_session(&self) -> Result<String> {
        let created: SessionCreated = self
            .http
            .get(self.url("/session"))
            .send()
            .await
            .context("Session request failed")?
            .error_for_status()
            .context("Session creation failed")?
            .json()
            .await
            .context("Invalid session response")?;

        info!("Session created: {}", created.session_id);
        Ok(created.session_id)
    }

    async fn session_status(&self, session_id: &str) -> Result<AvailableFeatures> {
        let status: SessionStatus = self
            .http
            .get(self.url(&format!("/session/{}/status", session_id)))
            .send()
            .await
            .context("Status request failed")?
            .error_for_status()
            .context("Status request rejected")?
            .json()
            .await
            .context("Invalid status response")?;

        Ok(status.available_features)
    }

    async fn configure_api_keys(&self, session_id: &str, keys: &ApiKeys) -> Result<Vec<String>> {
        let response: ApiKeysResponse = self
            .http
            .post(self.url(&format!("/session/{}/api-keys", session_id)))
            .json(keys)
            .send()
            .await
            .context("API key request failed")?
            .error_for_status()
            .context("Failed to save API keys")?
            .json()
            .await
            .context("Invalid API key response")?;

        info!("API keys configured: {:?}", response.configured_keys);
        Ok(response.configured_keys)
    }

    async fn connect(
        &self,
        session_id: &str,
        conn_id: ConnId,
        events: EventSender,
    ) -> Result<SocketHandle> {
        let url = socket::session_url(&self.base_url, session_id);
        socket::open(&url, conn_id, events).await
    }
}
