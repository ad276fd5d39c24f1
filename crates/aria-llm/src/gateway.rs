//! The gateway: provider lookup, credential cache, and the bounded retry
//! loop wrapped around every remote query.

use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::providers;
use aria_core::{settings, Store};
use dashmap::DashMap;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for provider queries. The delay is fixed, not exponential;
/// a provider that is down stays down on this timescale.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Normalized access to every configured AI backend.
///
/// Credentials live in an in-memory cache seeded from the store's settings
/// table at construction; `set_credential` writes through so the cache and
/// the store never diverge.
pub struct ProviderGateway {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    credentials: DashMap<String, String>,
    store: Arc<dyn Store>,
    client: Client,
    config: GatewayConfig,
}

impl ProviderGateway {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_providers(store, providers::builtin(), GatewayConfig::default())
    }

    pub fn with_providers(
        store: Arc<dyn Store>,
        providers: BTreeMap<String, Arc<dyn Provider>>,
        config: GatewayConfig,
    ) -> Self {
        let credentials = DashMap::new();
        for name in providers.keys() {
            match store.setting(&settings::api_key(name)) {
                Ok(Some(key)) if !key.is_empty() => {
                    credentials.insert(name.clone(), key);
                }
                Ok(_) => {}
                Err(e) => warn!(provider = %name, error = %e, "credential lookup failed"),
            }
        }
        debug!(loaded = credentials.len(), "provider credentials loaded");
        Self {
            providers,
            credentials,
            store,
            client: Client::new(),
            config,
        }
    }

    /// Update a provider credential, writing through to the settings table.
    pub fn set_credential(&self, provider: &str, key: &str) -> ProviderResult<()> {
        if !self.providers.contains_key(provider) {
            return Err(ProviderError::UnknownProvider(provider.to_string()));
        }
        self.store.set_setting(&settings::api_key(provider), key)?;
        if key.is_empty() {
            self.credentials.remove(provider);
        } else {
            self.credentials
                .insert(provider.to_string(), key.to_string());
        }
        Ok(())
    }

    pub fn credential(&self, provider: &str) -> Option<String> {
        self.credentials.get(provider).map(|c| c.value().clone())
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Providers worth querying without explicit selection: everything with a
    /// configured credential, plus backends that never need one.
    pub fn default_targets(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|(name, p)| !p.requires_credential() || self.credentials.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Query one provider with bounded retries. A missing credential fails
    /// before any network attempt; everything else retries up to the limit
    /// and surfaces as `RetryExhausted`.
    pub async fn query(
        &self,
        provider: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> ProviderResult<String> {
        let backend = self
            .providers
            .get(provider)
            .ok_or_else(|| ProviderError::UnknownProvider(provider.to_string()))?;

        let credential = self.credential(provider);
        if backend.requires_credential() && credential.is_none() {
            return Err(ProviderError::MissingCredential(provider.to_string()));
        }

        for attempt in 1..=self.config.max_retries {
            match backend
                .query(&self.client, prompt, model, credential.as_deref())
                .await
            {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        provider,
                        attempt,
                        max = self.config.max_retries,
                        error = %e,
                        "provider query failed"
                    );
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }
        Err(ProviderError::RetryExhausted {
            provider: provider.to_string(),
            attempts: self.config.max_retries,
        })
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingProvider {
        attempts: AtomicU32,
    }

    #[async_trait::async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        fn requires_credential(&self) -> bool {
            false
        }
        async fn query(
            &self,
            _client: &Client,
            _prompt: &str,
            _model: Option<&str>,
            _credential: Option<&str>,
        ) -> ProviderResult<String> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::malformed("failing", "always broken"))
        }
    }

    struct EchoProvider;

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }
        fn requires_credential(&self) -> bool {
            false
        }
        async fn query(
            &self,
            _client: &Client,
            prompt: &str,
            _model: Option<&str>,
            _credential: Option<&str>,
        ) -> ProviderResult<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    fn fast_config() -> GatewayConfig {
        GatewayConfig {
            max_retries: 3,
            retry_delay: Duration::from_millis(0),
        }
    }

    fn table(providers: Vec<Arc<dyn Provider>>) -> BTreeMap<String, Arc<dyn Provider>> {
        providers
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect()
    }

    #[tokio::test]
    async fn retry_exhaustion_counts_attempts_exactly() {
        let failing = Arc::new(FailingProvider {
            attempts: AtomicU32::new(0),
        });
        let gateway = ProviderGateway::with_providers(
            Arc::new(MemoryStore::new()),
            table(vec![failing.clone()]),
            fast_config(),
        );
        let err = gateway.query("failing", "hi", None).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RetryExhausted { attempts: 3, .. }
        ));
        assert_eq!(failing.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_credential_fails_without_an_attempt() {
        let store = Arc::new(MemoryStore::new());
        let gateway = ProviderGateway::with_providers(
            store,
            providers::builtin(),
            fast_config(),
        );
        let err = gateway.query("openai", "hi", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let gateway = ProviderGateway::with_providers(
            Arc::new(MemoryStore::new()),
            table(vec![Arc::new(EchoProvider)]),
            fast_config(),
        );
        let err = gateway.query("nope", "hi", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn successful_query_passes_through() {
        let gateway = ProviderGateway::with_providers(
            Arc::new(MemoryStore::new()),
            table(vec![Arc::new(EchoProvider)]),
            fast_config(),
        );
        let text = gateway.query("echo", "hello", None).await.unwrap();
        assert_eq!(text, "echo: hello");
    }

    #[tokio::test]
    async fn set_credential_writes_through_to_settings() {
        let store = Arc::new(MemoryStore::new());
        let gateway = ProviderGateway::with_providers(
            store.clone(),
            providers::builtin(),
            fast_config(),
        );
        gateway.set_credential("openai", "sk-test").unwrap();
        assert_eq!(gateway.credential("openai").as_deref(), Some("sk-test"));
        assert_eq!(
            store.setting("api_key_openai").unwrap().as_deref(),
            Some("sk-test")
        );
        assert!(gateway.set_credential("nope", "x").is_err());
    }

    #[tokio::test]
    async fn default_targets_are_credentialed_or_local() {
        let store = Arc::new(MemoryStore::new());
        store.set_setting("api_key_openai", "sk-test").unwrap();
        let gateway = ProviderGateway::with_providers(
            store,
            providers::builtin(),
            fast_config(),
        );
        let targets = gateway.default_targets();
        assert!(targets.contains(&"openai".to_string()));
        assert!(targets.contains(&"ollama".to_string()));
        assert!(targets.contains(&"custom".to_string()));
        assert!(!targets.contains(&"anthropic".to_string()));
    }
}
