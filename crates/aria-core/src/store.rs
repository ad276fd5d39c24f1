//! Persistence Port: the narrow read/write contract every background
//! component consumes. The real store (schema, SQL) lives outside this
//! workspace; [`MemoryStore`] is the reference implementation used by the
//! daemon default and by tests.

use crate::error::{Error, Result};
use crate::types::{clamp_confidence, DataSource, KnowledgeItem, PeerAi, PendingUpdate, UpdateKind};
use chrono::Utc;
use std::sync::Mutex;

pub trait Store: Send + Sync {
    // Knowledge: append-only, ranked by confidence on read.
    fn add_knowledge(&self, topic: &str, content: &str, source: &str, confidence: f64)
        -> Result<()>;
    fn knowledge(&self, topic_filter: Option<&str>, min_confidence: f64)
        -> Result<Vec<KnowledgeItem>>;

    // Pending updates: enqueue, list unapplied, mark applied exactly once.
    fn enqueue_update(&self, kind: UpdateKind, payload: serde_json::Value) -> Result<i64>;
    fn pending_updates(&self) -> Result<Vec<PendingUpdate>>;
    fn mark_applied(&self, id: i64) -> Result<()>;

    // Data sources: registered once, disabled rather than deleted.
    fn add_data_source(
        &self,
        name: &str,
        url: &str,
        credential: &str,
        update_frequency_secs: i64,
    ) -> Result<i64>;
    fn data_sources(&self, enabled_only: bool) -> Result<Vec<DataSource>>;
    fn touch_data_source(&self, id: i64) -> Result<()>;

    // Peers: soft-deleted via the enabled flag.
    fn add_peer(&self, name: &str, endpoint: &str, credential: &str) -> Result<i64>;
    fn peers(&self, enabled_only: bool) -> Result<Vec<PeerAi>>;
    fn touch_peer(&self, id: i64) -> Result<()>;
    fn disable_peer(&self, id: i64) -> Result<()>;

    // Settings: key-indexed text values.
    fn setting(&self, key: &str) -> Result<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    knowledge: Vec<KnowledgeItem>,
    updates: Vec<PendingUpdate>,
    sources: Vec<DataSource>,
    peers: Vec<PeerAi>,
    settings: std::collections::HashMap<String, String>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store with sequential ids. Single mutex; every operation is a
/// short critical section, so contention is not a concern here.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn add_knowledge(
        &self,
        topic: &str,
        content: &str,
        source: &str,
        confidence: f64,
    ) -> Result<()> {
        let mut st = self.state.lock().expect("store poisoned");
        st.knowledge.push(KnowledgeItem {
            topic: topic.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            confidence: clamp_confidence(confidence),
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn knowledge(
        &self,
        topic_filter: Option<&str>,
        min_confidence: f64,
    ) -> Result<Vec<KnowledgeItem>> {
        let st = self.state.lock().expect("store poisoned");
        let mut items: Vec<KnowledgeItem> = st
            .knowledge
            .iter()
            .filter(|k| k.confidence >= min_confidence)
            .filter(|k| topic_filter.map_or(true, |t| k.topic.contains(t)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(items)
    }

    fn enqueue_update(&self, kind: UpdateKind, payload: serde_json::Value) -> Result<i64> {
        let mut st = self.state.lock().expect("store poisoned");
        let id = st.next_id();
        st.updates.push(PendingUpdate {
            id,
            kind,
            payload,
            applied: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn pending_updates(&self) -> Result<Vec<PendingUpdate>> {
        let st = self.state.lock().expect("store poisoned");
        Ok(st.updates.iter().filter(|u| !u.applied).cloned().collect())
    }

    fn mark_applied(&self, id: i64) -> Result<()> {
        let mut st = self.state.lock().expect("store poisoned");
        let update = st
            .updates
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(Error::not_found("update", id))?;
        if update.applied {
            return Err(Error::AlreadyApplied(id));
        }
        update.applied = true;
        Ok(())
    }

    fn add_data_source(
        &self,
        name: &str,
        url: &str,
        credential: &str,
        update_frequency_secs: i64,
    ) -> Result<i64> {
        if update_frequency_secs < 1 {
            return Err(Error::InvalidFrequency(update_frequency_secs));
        }
        let mut st = self.state.lock().expect("store poisoned");
        let id = st.next_id();
        st.sources.push(DataSource {
            id,
            name: name.to_string(),
            url: url.to_string(),
            credential: credential.to_string(),
            last_updated: Utc::now(),
            update_frequency_secs,
            enabled: true,
        });
        Ok(id)
    }

    fn data_sources(&self, enabled_only: bool) -> Result<Vec<DataSource>> {
        let st = self.state.lock().expect("store poisoned");
        Ok(st
            .sources
            .iter()
            .filter(|s| !enabled_only || s.enabled)
            .cloned()
            .collect())
    }

    fn touch_data_source(&self, id: i64) -> Result<()> {
        let mut st = self.state.lock().expect("store poisoned");
        let src = st
            .sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(Error::not_found("data_source", id))?;
        src.last_updated = Utc::now();
        Ok(())
    }

    fn add_peer(&self, name: &str, endpoint: &str, credential: &str) -> Result<i64> {
        let mut st = self.state.lock().expect("store poisoned");
        let id = st.next_id();
        st.peers.push(PeerAi {
            id,
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            credential: credential.to_string(),
            last_communication: Utc::now(),
            enabled: true,
        });
        Ok(id)
    }

    fn peers(&self, enabled_only: bool) -> Result<Vec<PeerAi>> {
        let st = self.state.lock().expect("store poisoned");
        Ok(st
            .peers
            .iter()
            .filter(|p| !enabled_only || p.enabled)
            .cloned()
            .collect())
    }

    fn touch_peer(&self, id: i64) -> Result<()> {
        let mut st = self.state.lock().expect("store poisoned");
        let peer = st
            .peers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::not_found("peer", id))?;
        peer.last_communication = Utc::now();
        Ok(())
    }

    fn disable_peer(&self, id: i64) -> Result<()> {
        let mut st = self.state.lock().expect("store poisoned");
        let peer = st
            .peers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::not_found("peer", id))?;
        peer.enabled = false;
        Ok(())
    }

    fn setting(&self, key: &str) -> Result<Option<String>> {
        let st = self.state.lock().expect("store poisoned");
        Ok(st.settings.get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut st = self.state.lock().expect("store poisoned");
        st.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
