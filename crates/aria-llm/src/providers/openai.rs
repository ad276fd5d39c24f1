//! OpenAI chat-completions provider.

use crate::provider::{expect_success, Provider, ProviderError, ProviderResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenAiProvider {
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new() -> Self {
        Self {
            endpoint: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        model: Option<&str>,
        credential: Option<&str>,
    ) -> ProviderResult<String> {
        let body = ChatRequest {
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.7,
        };
        debug!(model = %body.model, "openai request");

        let response = client
            .post(&self.endpoint)
            .bearer_auth(credential.unwrap_or_default())
            .timeout(TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let response = expect_success(self.name(), response).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(self.name(), e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::malformed(self.name(), "empty choices array"))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
