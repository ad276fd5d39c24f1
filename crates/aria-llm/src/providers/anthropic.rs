//! Anthropic messages provider.

use crate::provider::{expect_success, Provider, ProviderError, ProviderResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const MAX_TOKENS: u32 = 1000;
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct AnthropicProvider {
    endpoint: String,
}

impl AnthropicProvider {
    pub fn new() -> Self {
        Self {
            endpoint: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        model: Option<&str>,
        credential: Option<&str>,
    ) -> ProviderResult<String> {
        let body = MessagesRequest {
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: MAX_TOKENS,
        };
        debug!(model = %body.model, "anthropic request");

        let response = client
            .post(&self.endpoint)
            .header("x-api-key", credential.unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let response = expect_success(self.name(), response).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(self.name(), e.to_string()))?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .ok_or_else(|| ProviderError::malformed(self.name(), "empty content array"))
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}
