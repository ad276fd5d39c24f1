//! Google Gemini provider. The credential rides in the query string rather
//! than a header.

use crate::provider::{expect_success, Provider, ProviderError, ProviderResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models/";
const DEFAULT_MODEL: &str = "gemini-pro";
const MAX_OUTPUT_TOKENS: u32 = 1000;
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct GeminiProvider {
    base: String,
}

impl GeminiProvider {
    pub fn new() -> Self {
        Self {
            base: GEMINI_API_BASE.to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        model: Option<&str>,
        credential: Option<&str>,
    ) -> ProviderResult<String> {
        let model = model.unwrap_or(DEFAULT_MODEL);
        let url = format!("{}{}:generateContent", self.base, model);
        debug!(model, "gemini request");

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = client
            .post(&url)
            .query(&[("key", credential.unwrap_or_default())])
            .timeout(TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let response = expect_success(self.name(), response).await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(self.name(), e.to_string()))?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::malformed(self.name(), "empty candidates array"))
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}
