//! Peer wire transport. The registry talks to peers only through
//! [`PeerTransport`], so messaging logic is testable without a network.

use crate::error::{FederationError, FederationResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[async_trait::async_trait]
pub trait PeerTransport: Send + Sync {
    /// POST a JSON payload and return the parsed JSON reply. Non-2xx status
    /// and unparseable bodies are errors; callers decide whether an error
    /// aborts anything or just maps to a null entry.
    async fn post(
        &self,
        endpoint: &str,
        credential: Option<&str>,
        payload: &Value,
        timeout: Duration,
    ) -> FederationResult<Value>;
}

/// JSON-over-HTTPS transport with optional bearer credential.
pub struct HttpPeerTransport {
    client: Client,
}

impl HttpPeerTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpPeerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PeerTransport for HttpPeerTransport {
    async fn post(
        &self,
        endpoint: &str,
        credential: Option<&str>,
        payload: &Value,
        timeout: Duration,
    ) -> FederationResult<Value> {
        debug!(endpoint, "peer request");
        let mut request = self.client.post(endpoint).timeout(timeout).json(payload);
        if let Some(cred) = credential.filter(|c| !c.is_empty()) {
            request = request.bearer_auth(cred);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FederationError::rejected(endpoint, status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| FederationError::malformed(endpoint, e.to_string()))
    }
}
