//! Integration tests for aria-federation: registry, messaging, and
//! knowledge exchange over a stub transport.

use aria_core::{MemoryStore, Store};
use aria_federation::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedTransport {
    calls: Mutex<Vec<(String, Value)>>,
    reply: Value,
}

impl ScriptedTransport {
    fn new(reply: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply,
        }
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PeerTransport for ScriptedTransport {
    async fn post(
        &self,
        endpoint: &str,
        _credential: Option<&str>,
        payload: &Value,
        _timeout: Duration,
    ) -> FederationResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload.clone()));
        Ok(self.reply.clone())
    }
}

// ===========================================================================
// Registry lifecycle
// ===========================================================================

#[tokio::test]
async fn register_message_and_remove_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(json!({"status": "ok"})));
    let registry = PeerRegistry::new(store.clone(), transport.clone()).unwrap();

    registry.add_peer("helios", "https://h.example", "secret").unwrap();
    assert_eq!(registry.active_peers(), ["helios"]);

    let reply = registry.send_message("helios", json!("hello")).await.unwrap();
    assert_eq!(reply, Some(json!({"status": "ok"})));
    assert_eq!(transport.calls()[0].0, "https://h.example");

    registry.remove_peer("helios").unwrap();
    assert!(registry.active_peers().is_empty());
    assert_eq!(store.peers(false).unwrap().len(), 1);
}

// ===========================================================================
// Health pass against the store
// ===========================================================================

#[tokio::test]
async fn health_pass_reads_the_store_fresh_and_learns_from_replies() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(json!({
        "status": "healthy",
        "shared_knowledge": [{"topic": "weather", "content": "sunny"}]
    })));
    let registry = PeerRegistry::new(store.clone(), transport.clone()).unwrap();

    // Written through the store only, as the update pipeline does.
    store.add_peer("late", "https://late.example", "").unwrap();

    registry.health_check_all().await.unwrap();

    assert_eq!(transport.calls().len(), 1);
    assert_eq!(transport.calls()[0].1["message"], json!("status_check"));

    let learned = store.knowledge(Some("weather"), 0.0).unwrap();
    assert_eq!(learned.len(), 1);
    assert_eq!(learned[0].source, "peer_late");
    assert_eq!(learned[0].confidence, 0.8);
}
