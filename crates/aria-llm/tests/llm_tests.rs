//! Integration tests for aria-llm: gateway, credential handling, and the
//! aggregator working together over canned providers.

use aria_llm::*;
use aria_core::{MemoryStore, Store};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct CannedProvider {
    name: &'static str,
    reply: Option<&'static str>,
    needs_credential: bool,
}

#[async_trait::async_trait]
impl Provider for CannedProvider {
    fn name(&self) -> &str {
        self.name
    }
    fn requires_credential(&self) -> bool {
        self.needs_credential
    }
    async fn query(
        &self,
        _client: &Client,
        _prompt: &str,
        _model: Option<&str>,
        _credential: Option<&str>,
    ) -> ProviderResult<String> {
        match self.reply {
            Some(text) => Ok(text.to_string()),
            None => Err(ProviderError::malformed(self.name, "down")),
        }
    }
}

fn gateway(
    store: Arc<MemoryStore>,
    providers: Vec<CannedProvider>,
) -> Arc<ProviderGateway> {
    let table: BTreeMap<String, Arc<dyn Provider>> = providers
        .into_iter()
        .map(|p| (p.name.to_string(), Arc::new(p) as Arc<dyn Provider>))
        .collect();
    Arc::new(ProviderGateway::with_providers(
        store,
        table,
        GatewayConfig {
            max_retries: 2,
            retry_delay: Duration::from_millis(0),
        },
    ))
}

// ===========================================================================
// Gateway
// ===========================================================================

#[tokio::test]
async fn credentials_seed_from_settings_and_gate_fanout() {
    let store = Arc::new(MemoryStore::new());
    store.set_setting("api_key_paid", "sk-x").unwrap();

    let gateway = gateway(
        store,
        vec![
            CannedProvider { name: "paid", reply: Some("yes"), needs_credential: true },
            CannedProvider { name: "unpaid", reply: Some("no"), needs_credential: true },
            CannedProvider { name: "local", reply: Some("hi"), needs_credential: false },
        ],
    );

    assert_eq!(gateway.credential("paid").as_deref(), Some("sk-x"));
    assert_eq!(gateway.default_targets(), ["local", "paid"]);

    let err = gateway.query("unpaid", "q", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::MissingCredential(_)));
}

// ===========================================================================
// Aggregator over the gateway
// ===========================================================================

#[tokio::test]
async fn fanout_persists_answers_and_selects_across_failures() {
    let store = Arc::new(MemoryStore::new());
    let gateway = gateway(
        store.clone(),
        vec![
            CannedProvider { name: "a", reply: None, needs_credential: false },
            CannedProvider { name: "b", reply: Some("short"), needs_credential: false },
            CannedProvider { name: "c", reply: Some("a longer answer"), needs_credential: false },
        ],
    );
    let aggregator = Aggregator::new(gateway);

    let first = aggregator
        .select_best("q", None, Strategy::FirstValid)
        .await;
    assert_eq!(first.text(), Some("short"));

    let longest = aggregator.select_best("q", None, Strategy::Longest).await;
    assert_eq!(longest.text(), Some("a longer answer"));

    // Every successful answer was stored for later retrieval.
    let learned = store.knowledge(Some("collaboration_"), 0.0).unwrap();
    assert!(learned.iter().all(|k| k.confidence == 0.8));
    assert!(learned.iter().any(|k| k.source == "b"));
    assert!(learned.iter().any(|k| k.source == "c"));
    assert!(!learned.iter().any(|k| k.source == "a"));
}

// ===========================================================================
// Builtin table
// ===========================================================================

#[test]
fn builtin_providers_cover_the_expected_backends() {
    let table = providers::builtin();
    for name in ["openai", "anthropic", "gemini", "huggingface", "ollama", "custom"] {
        assert!(table.contains_key(name), "{name}");
    }
}
