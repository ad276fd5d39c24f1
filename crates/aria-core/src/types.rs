//! Data model for the integration layer: data sources, pending updates,
//! knowledge items, and peer assistants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered remote endpoint providing periodic bulk content.
///
/// Never deleted, only disabled; `last_updated` moves forward on every
/// attempted refresh so a misbehaving source cannot cause a retry storm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSource {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Bearer credential, empty when the source is public.
    pub credential: String,
    pub last_updated: DateTime<Utc>,
    pub update_frequency_secs: i64,
    pub enabled: bool,
}

impl DataSource {
    /// True when the refresh interval has elapsed at `now`.
    pub fn due(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_updated).num_seconds() >= self.update_frequency_secs
    }
}

/// A durable, typed instruction awaiting application to local state.
///
/// `applied` transitions false -> true exactly once and never reverts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub id: i64,
    pub kind: UpdateKind,
    pub payload: serde_json::Value,
    pub applied: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only knowledge entry. Duplicate topics are legal; reads rank by
/// confidence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub topic: String,
    pub content: String,
    pub source: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Another assistant instance reachable for messaging and knowledge exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerAi {
    pub id: i64,
    pub name: String,
    pub endpoint: String,
    pub credential: String,
    pub last_communication: DateTime<Utc>,
    pub enabled: bool,
}

/// The closed set of update types the pipeline knows how to apply.
///
/// Anything else parses to `Unknown` and stays pending until an operator
/// upgrades the handler table; it is never silently dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateKind {
    ModelWeights,
    KnowledgeBase,
    SystemConfig,
    DataSources,
    AiCommunications,
    Unknown(String),
}

impl UpdateKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "model_weights" => Self::ModelWeights,
            "knowledge_base" => Self::KnowledgeBase,
            "system_config" => Self::SystemConfig,
            "data_sources" => Self::DataSources,
            "ai_communications" => Self::AiCommunications,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ModelWeights => "model_weights",
            Self::KnowledgeBase => "knowledge_base",
            Self::SystemConfig => "system_config",
            Self::DataSources => "data_sources",
            Self::AiCommunications => "ai_communications",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for UpdateKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<UpdateKind> for String {
    fn from(k: UpdateKind) -> Self {
        k.as_str().to_string()
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence is a [0,1] ranking scalar; out-of-range caller input is clamped
/// rather than rejected.
pub fn clamp_confidence(c: f64) -> f64 {
    if c.is_nan() {
        return 0.0;
    }
    c.clamp(0.0, 1.0)
}
