//! Hugging Face inference-API provider. The model name is part of the URL
//! and the response is an array of generations.

use crate::provider::{expect_success, Provider, ProviderError, ProviderResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const HF_API_BASE: &str = "https://api-inference.huggingface.co/models/";
const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct HuggingFaceProvider {
    base: String,
}

impl HuggingFaceProvider {
    pub fn new() -> Self {
        Self {
            base: HF_API_BASE.to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

impl Default for HuggingFaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Provider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        model: Option<&str>,
        credential: Option<&str>,
    ) -> ProviderResult<String> {
        let model = model.unwrap_or(DEFAULT_MODEL);
        let url = format!("{}{}", self.base, model);
        debug!(model, "huggingface request");

        let response = client
            .post(&url)
            .bearer_auth(credential.unwrap_or_default())
            .timeout(TIMEOUT)
            .json(&InferenceRequest {
                inputs: prompt.to_string(),
            })
            .send()
            .await?;
        let response = expect_success(self.name(), response).await?;

        let parsed: Vec<Generation> = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(self.name(), e.to_string()))?;
        parsed
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| ProviderError::malformed(self.name(), "empty generation array"))
    }
}

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
}

#[derive(Deserialize)]
struct Generation {
    generated_text: String,
}
