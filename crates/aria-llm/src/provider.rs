//! Provider trait and error types.

use reqwest::Client;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider error types. Transport, remote-status, and malformed-body
/// failures are all retryable inside the gateway; the rest fail fast.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Remote {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {provider}: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("no credential configured for {0}")]
    MissingCredential(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{provider} failed after {attempts} attempts")]
    RetryExhausted { provider: String, attempts: u32 },

    #[error("store error: {0}")]
    Store(#[from] aria_core::Error),
}

impl ProviderError {
    pub fn remote(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

/// One remote AI backend. Each implementation owns its request shaping and
/// response extraction; retry and credential policy live in the gateway.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// False only for backends reachable without a credential (local runtime).
    fn requires_credential(&self) -> bool {
        true
    }

    /// Send `prompt` and extract the response text. `credential` is `None`
    /// only when `requires_credential` is false or the backend treats the
    /// credential as optional.
    async fn query(
        &self,
        client: &Client,
        prompt: &str,
        model: Option<&str>,
        credential: Option<&str>,
    ) -> ProviderResult<String>;
}

/// Check the response status, surfacing non-2xx as a remote error.
pub(crate) async fn expect_success(
    provider: &str,
    response: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::remote(provider, status.as_u16(), body))
}
