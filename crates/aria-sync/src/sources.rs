//! Source sync engine: decides which registered data sources are due,
//! fetches their payloads, and ingests them by per-source rules.

use crate::error::{SyncError, SyncResult};
use aria_core::{DataSource, Store, UpdateKind};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// News items rank high but never above locally curated knowledge.
const NEWS_CONFIDENCE: f64 = 0.9;

struct DefaultSource {
    name: &'static str,
    url: &'static str,
    frequency_secs: i64,
}

const DEFAULT_SOURCES: [DefaultSource; 3] = [
    DefaultSource {
        name: "knowledge_base",
        url: "https://api.example.com/knowledge",
        frequency_secs: 86_400,
    },
    DefaultSource {
        name: "model_updates",
        url: "https://api.example.com/model_updates",
        frequency_secs: 604_800,
    },
    DefaultSource {
        name: "news_feed",
        url: "https://api.example.com/news",
        frequency_secs: 3_600,
    },
];

pub struct SourceSyncEngine {
    store: Arc<dyn Store>,
    client: Client,
}

impl SourceSyncEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            client: Client::new(),
        }
    }

    /// Register the default source set, only when the registry is empty
    /// (including disabled rows, so a deliberately disabled default is not
    /// resurrected).
    pub fn seed_defaults(&self) -> SyncResult<()> {
        if !self.store.data_sources(false)?.is_empty() {
            return Ok(());
        }
        for source in &DEFAULT_SOURCES {
            self.store
                .add_data_source(source.name, source.url, "", source.frequency_secs)?;
        }
        info!("default data sources registered");
        Ok(())
    }

    /// One refresh pass over every enabled source. A due source is fetched
    /// and ingested; `last_updated` moves forward on every attempt so a
    /// broken source waits out its full interval before the next try.
    pub async fn run_pass(&self) -> SyncResult<()> {
        let now = Utc::now();
        for source in self.store.data_sources(true)? {
            if !source.due(now) {
                continue;
            }
            info!(source = %source.name, "refreshing data source");
            match self.refresh(&source).await {
                Ok(payload) => {
                    match ingest(self.store.as_ref(), &source.name, &payload) {
                        Ok(count) => debug!(source = %source.name, count, "ingested"),
                        Err(e) => error!(source = %source.name, error = %e, "ingestion failed"),
                    }
                }
                Err(e) => warn!(source = %source.name, error = %e, "refresh failed"),
            }
            self.store.touch_data_source(source.id)?;
        }
        Ok(())
    }

    async fn refresh(&self, source: &DataSource) -> SyncResult<Value> {
        let mut request = self.client.get(&source.url).timeout(FETCH_TIMEOUT);
        if !source.credential.is_empty() {
            request = request.bearer_auth(&source.credential);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::rejected(&source.name, status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| SyncError::malformed(&source.name, e.to_string()))
    }
}

/// Apply a source payload to the store by the source's ingestion rule.
/// Unrecognized source names are a silent no-op. Returns the number of
/// items taken from the payload.
pub fn ingest(store: &dyn Store, source_name: &str, payload: &Value) -> SyncResult<usize> {
    let items = match payload.as_array() {
        Some(items) => items,
        None => return Ok(0),
    };

    let mut count = 0;
    match source_name {
        "knowledge_base" => {
            for item in items {
                let (Some(topic), Some(content)) = (
                    item.get("topic").and_then(|v| v.as_str()),
                    item.get("content").and_then(|v| v.as_str()),
                ) else {
                    continue;
                };
                let source = item
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or(source_name);
                let confidence = item
                    .get("confidence")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(1.0);
                store.add_knowledge(topic, content, source, confidence)?;
                count += 1;
            }
        }
        "model_updates" => {
            for descriptor in items {
                let Some(kind) = descriptor.get("type").and_then(|v| v.as_str()) else {
                    continue;
                };
                store.enqueue_update(UpdateKind::parse(kind), descriptor.clone())?;
                count += 1;
            }
        }
        "news_feed" => {
            for news in items {
                let (Some(title), Some(content)) = (
                    news.get("title").and_then(|v| v.as_str()),
                    news.get("content").and_then(|v| v.as_str()),
                ) else {
                    continue;
                };
                let category = news
                    .get("category")
                    .and_then(|v| v.as_str())
                    .unwrap_or("general");
                let source = news
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or(source_name);
                store.add_knowledge(
                    &format!("news_{category}"),
                    &format!("{title}: {content}"),
                    source,
                    NEWS_CONFIDENCE,
                )?;
                count += 1;
            }
        }
        other => {
            debug!(source = other, "no ingestion rule, payload ignored");
        }
    }
    Ok(count)
}
