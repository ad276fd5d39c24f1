//! Local Ollama provider: credential-free, longer timeout since generation
//! runs on whatever hardware is at hand.

use crate::provider::{expect_success, Provider, ProviderError, ProviderResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OLLAMA_API_URL: &str = "http://localhost:11434/api/chat";
const DEFAULT_MODEL: &str = "llama3";
const TIMEOUT: Duration = Duration::from_secs(60);

pub struct OllamaProvider {
    endpoint: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            endpoint: OLLAMA_API_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        model: Option<&str>,
        _credential: Option<&str>,
    ) -> ProviderResult<String> {
        let body = ChatRequest {
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };
        debug!(model = %body.model, "ollama request");

        let response = client
            .post(&self.endpoint)
            .timeout(TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let response = expect_success(self.name(), response).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(self.name(), e.to_string()))?;
        Ok(parsed.message.content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
