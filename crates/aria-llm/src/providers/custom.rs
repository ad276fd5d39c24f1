//! Catch-all provider for a single-string-prompt JSON endpoint. The
//! credential is optional; when present it is sent as a bearer token.

use crate::provider::{expect_success, Provider, ProviderError, ProviderResult};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const TIMEOUT: Duration = Duration::from_secs(30);

pub struct CustomProvider {
    name: String,
    endpoint: String,
}

impl CustomProvider {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for CustomProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        _model: Option<&str>,
        credential: Option<&str>,
    ) -> ProviderResult<String> {
        debug!(provider = %self.name, "custom provider request");

        let mut request = client.post(&self.endpoint).timeout(TIMEOUT).json(
            &PromptRequest {
                prompt: prompt.to_string(),
            },
        );
        if let Some(cred) = credential.filter(|c| !c.is_empty()) {
            request = request.bearer_auth(cred);
        }
        let response = expect_success(self.name(), request.send().await?).await?;

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(self.name(), e.to_string()))?;
        // Prefer the conventional `response` field, fall back to the raw body.
        Ok(parsed
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| parsed.to_string()))
    }
}

#[derive(Serialize)]
struct PromptRequest {
    prompt: String,
}
