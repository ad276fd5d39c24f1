//! Peer registry and broadcaster. Keeps an in-memory index of enabled peers
//! rebuilt from the store on load and on every mutation; all messaging goes
//! through the index, never the store directly.

use crate::error::FederationResult;
use crate::transport::PeerTransport;
use aria_core::{settings, PeerAi, Store};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Confidence assigned to knowledge learned from peers when the item does
/// not carry its own.
const PEER_KNOWLEDGE_CONFIDENCE: f64 = 0.8;

pub struct PeerRegistry {
    store: Arc<dyn Store>,
    transport: Arc<dyn PeerTransport>,
    index: DashMap<String, PeerAi>,
    sender: String,
}

impl PeerRegistry {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn PeerTransport>,
    ) -> FederationResult<Self> {
        let sender = store
            .setting(settings::INSTANCE_ID)?
            .unwrap_or_else(|| settings::DEFAULT_SENDER.to_string());
        let registry = Self {
            store,
            transport,
            index: DashMap::new(),
            sender,
        };
        registry.reload()?;
        Ok(registry)
    }

    /// Rebuild the in-memory index from the store's enabled peers.
    pub fn reload(&self) -> FederationResult<()> {
        let peers = self.store.peers(true)?;
        self.index.clear();
        for peer in peers {
            self.index.insert(peer.name.clone(), peer);
        }
        debug!(peers = self.index.len(), "peer index reloaded");
        Ok(())
    }

    pub fn add_peer(
        &self,
        name: &str,
        endpoint: &str,
        credential: &str,
    ) -> FederationResult<i64> {
        let id = self.store.add_peer(name, endpoint, credential)?;
        self.reload()?;
        info!(peer = name, "peer registered");
        Ok(id)
    }

    /// Soft-delete: the store row is disabled and the peer leaves the index.
    /// In-flight requests against the old entry are not revoked.
    pub fn remove_peer(&self, name: &str) -> FederationResult<()> {
        let peer = self
            .index
            .remove(name)
            .map(|(_, p)| p)
            .ok_or_else(|| crate::FederationError::UnknownPeer(name.to_string()))?;
        self.store.disable_peer(peer.id)?;
        info!(peer = name, "peer removed");
        Ok(())
    }

    /// Names of every peer in the index, sorted for deterministic fan-out.
    pub fn active_peers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn envelope(&self, message: Value) -> Value {
        json!({
            "message": message,
            "sender": self.sender,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    /// POST a message envelope to one peer. An unreachable or rejecting peer
    /// maps to `None`; only on success is `last_communication` touched.
    pub async fn send_message(
        &self,
        peer_name: &str,
        message: Value,
    ) -> FederationResult<Option<Value>> {
        let peer = match self.index.get(peer_name) {
            Some(entry) => entry.value().clone(),
            None => {
                warn!(peer = peer_name, "message to unknown peer dropped");
                return Ok(None);
            }
        };

        let payload = self.envelope(message);
        let credential = (!peer.credential.is_empty()).then_some(peer.credential.as_str());
        match self
            .transport
            .post(&peer.endpoint, credential, &payload, MESSAGE_TIMEOUT)
            .await
        {
            Ok(reply) => {
                self.store.touch_peer(peer.id)?;
                debug!(peer = peer_name, "message delivered");
                Ok(Some(reply))
            }
            Err(e) => {
                warn!(peer = peer_name, error = %e, "message delivery failed");
                Ok(None)
            }
        }
    }

    /// Send `message` to every active peer, one entry per peer in the
    /// returned map; failures are `None` entries, never aborts.
    pub async fn broadcast(
        &self,
        message: Value,
    ) -> FederationResult<std::collections::BTreeMap<String, Option<Value>>> {
        let mut results = std::collections::BTreeMap::new();
        for name in self.active_peers() {
            let reply = self.send_message(&name, message.clone()).await?;
            results.insert(name, reply);
        }
        Ok(results)
    }

    /// Ask a peer to share what it knows about `topic`. Any `knowledge`
    /// array in the reply is folded into the store with source `peer_<name>`
    /// and confidence defaulted when absent.
    pub async fn request_knowledge_sharing(
        &self,
        peer_name: &str,
        topic: &str,
    ) -> FederationResult<Option<Value>> {
        let request = json!({ "action": "share_knowledge", "topic": topic });
        let Some(reply) = self.send_message(peer_name, request).await? else {
            return Ok(None);
        };

        let Some(knowledge) = reply.get("knowledge") else {
            return Ok(None);
        };
        if let Some(items) = knowledge.as_array() {
            self.fold_knowledge(peer_name, items, Some(topic))?;
        }
        Ok(Some(knowledge.clone()))
    }

    /// Ask a peer what it can do. Returns the `capabilities` list, or `None`
    /// when the peer is unreachable or replies without one.
    pub async fn capabilities(&self, peer_name: &str) -> FederationResult<Option<Vec<String>>> {
        let request = json!({ "action": "get_capabilities" });
        let Some(reply) = self.send_message(peer_name, request).await? else {
            return Ok(None);
        };
        Ok(reply.get("capabilities").and_then(|v| v.as_array()).map(|caps| {
            caps.iter()
                .filter_map(|c| c.as_str())
                .map(str::to_string)
                .collect()
        }))
    }

    /// Ping every active peer with a status check. The index is rebuilt from
    /// the store first, so peers registered behind the registry's back (the
    /// update pipeline writes through the store) are picked up within one
    /// pass. `last_communication` is touched on every contact attempt
    /// regardless of outcome, so a dead peer's staleness is visible from the
    /// attempt, not the last success. Shared knowledge carried in replies is
    /// folded into the store.
    pub async fn health_check_all(&self) -> FederationResult<()> {
        self.reload()?;
        for name in self.active_peers() {
            let peer = match self.index.get(&name) {
                Some(entry) => entry.value().clone(),
                None => continue,
            };
            let payload = self.envelope(Value::String("status_check".to_string()));
            let credential = (!peer.credential.is_empty()).then_some(peer.credential.as_str());
            let outcome = self
                .transport
                .post(&peer.endpoint, credential, &payload, HEALTH_TIMEOUT)
                .await;
            self.store.touch_peer(peer.id)?;

            match outcome {
                Ok(reply) => {
                    if let Some(status) = reply.get("status").and_then(|s| s.as_str()) {
                        info!(peer = %name, status, "peer status");
                    }
                    if let Some(items) =
                        reply.get("shared_knowledge").and_then(|v| v.as_array())
                    {
                        self.fold_knowledge(&name, items, None)?;
                    }
                }
                Err(e) => warn!(peer = %name, error = %e, "peer health check failed"),
            }
        }
        Ok(())
    }

    /// Store knowledge items received from a peer. Items without both a
    /// topic (or fallback) and content are skipped.
    fn fold_knowledge(
        &self,
        peer_name: &str,
        items: &[Value],
        fallback_topic: Option<&str>,
    ) -> FederationResult<()> {
        let source = format!("peer_{peer_name}");
        for item in items {
            let Some(obj) = item.as_object() else { continue };
            let topic = obj
                .get("topic")
                .and_then(|t| t.as_str())
                .or(fallback_topic);
            let content = obj.get("content").and_then(|c| c.as_str());
            let (Some(topic), Some(content)) = (topic, content) else {
                continue;
            };
            let confidence = obj
                .get("confidence")
                .and_then(|c| c.as_f64())
                .unwrap_or(PEER_KNOWLEDGE_CONFIDENCE);
            self.store.add_knowledge(topic, content, &source, confidence)?;
        }
        Ok(())
    }
}
