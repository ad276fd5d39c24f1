//! Update pipeline: applies typed pending updates, marking each applied
//! exactly once. Handlers that fail leave the update pending, so application
//! is at-least-once; the weights download is made safe to repeat by writing
//! to a side file and renaming only on completion.

use crate::error::{SyncError, SyncResult};
use aria_core::{Store, UpdateKind};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

#[derive(Clone, Debug)]
pub struct UpdatePipelineConfig {
    /// Refresh interval for data sources registered without one.
    pub default_frequency_secs: i64,
    /// Destination for model weights when the update names no path.
    pub weights_path: PathBuf,
}

impl Default for UpdatePipelineConfig {
    fn default() -> Self {
        Self {
            default_frequency_secs: 3_600,
            weights_path: PathBuf::from("models/weights.bin"),
        }
    }
}

pub struct UpdatePipeline {
    store: Arc<dyn Store>,
    client: Client,
    config: UpdatePipelineConfig,
}

impl UpdatePipeline {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, UpdatePipelineConfig::default())
    }

    pub fn with_config(store: Arc<dyn Store>, config: UpdatePipelineConfig) -> Self {
        Self {
            store,
            client: Client::new(),
            config,
        }
    }

    /// Apply every pending update. A handler failure leaves its update
    /// pending for the next pass; an unknown type is never marked applied,
    /// so an operator can upgrade the handler table and redispatch.
    pub async fn apply_pending(&self) -> SyncResult<()> {
        for update in self.store.pending_updates()? {
            if let UpdateKind::Unknown(tag) = &update.kind {
                warn!(id = update.id, kind = %tag, "unknown update type, left pending");
                continue;
            }
            match self.apply(&update.kind, &update.payload).await {
                Ok(()) => {
                    self.store.mark_applied(update.id)?;
                    info!(id = update.id, kind = %update.kind, "update applied");
                }
                Err(e) => {
                    error!(id = update.id, kind = %update.kind, error = %e, "update failed");
                }
            }
        }
        Ok(())
    }

    async fn apply(&self, kind: &UpdateKind, payload: &Value) -> SyncResult<()> {
        match kind {
            UpdateKind::ModelWeights => self.apply_model_weights(payload).await,
            UpdateKind::KnowledgeBase => self.apply_knowledge(payload),
            UpdateKind::SystemConfig => self.apply_system_config(payload),
            UpdateKind::DataSources => self.apply_data_sources(payload),
            UpdateKind::AiCommunications => self.apply_peers(payload),
            UpdateKind::Unknown(_) => Ok(()),
        }
    }

    /// Stream-download new weights. The transfer has no timeout (weights can
    /// be large); the payload may override the destination via `local_path`.
    async fn apply_model_weights(&self, payload: &Value) -> SyncResult<()> {
        let Some(url) = payload.get("weights_url").and_then(|v| v.as_str()) else {
            return Ok(());
        };
        let path = payload
            .get("local_path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.weights_path.clone());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::rejected("model_weights", status.as_u16()));
        }
        persist_weights(&path, response.bytes_stream()).await?;
        info!(path = %path.display(), "model weights downloaded");
        Ok(())
    }

    fn apply_knowledge(&self, payload: &Value) -> SyncResult<()> {
        let Some(items) = payload.get("items").and_then(|v| v.as_array()) else {
            return Ok(());
        };
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
                .unwrap_or("update");
            let confidence = item
                .get("confidence")
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);
            self.store.add_knowledge(topic, content, source, confidence)?;
        }
        Ok(())
    }

    fn apply_system_config(&self, payload: &Value) -> SyncResult<()> {
        let Some(settings) = payload.get("settings").and_then(|v| v.as_object()) else {
            return Ok(());
        };
        for (key, value) in settings {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.store.set_setting(key, &text)?;
        }
        Ok(())
    }

    fn apply_data_sources(&self, payload: &Value) -> SyncResult<()> {
        let Some(sources) = payload.get("sources").and_then(|v| v.as_array()) else {
            return Ok(());
        };
        for source in sources {
            let (Some(name), Some(url)) = (
                source.get("name").and_then(|v| v.as_str()),
                source.get("url").and_then(|v| v.as_str()),
            ) else {
                continue;
            };
            let credential = source
                .get("api_key")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let frequency = source
                .get("update_frequency")
                .and_then(|v| v.as_i64())
                .unwrap_or(self.config.default_frequency_secs);
            self.store.add_data_source(name, url, credential, frequency)?;
        }
        Ok(())
    }

    fn apply_peers(&self, payload: &Value) -> SyncResult<()> {
        let Some(peers) = payload.get("communications").and_then(|v| v.as_array()) else {
            return Ok(());
        };
        for peer in peers {
            let (Some(name), Some(endpoint)) = (
                peer.get("ai_name").and_then(|v| v.as_str()),
                peer.get("api_endpoint").and_then(|v| v.as_str()),
            ) else {
                continue;
            };
            let credential = peer.get("api_key").and_then(|v| v.as_str()).unwrap_or("");
            self.store.add_peer(name, endpoint, credential)?;
        }
        Ok(())
    }
}

/// Write a byte stream to a `.partial` side file, then rename over `path`. A
/// crashed or repeated download never leaves a torn file at the target.
async fn persist_weights<S>(path: &Path, mut stream: S) -> SyncResult<()>
where
    S: futures::Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let partial = path.with_extension("partial");
    let mut file = tokio::fs::File::create(&partial).await?;
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    tokio::fs::rename(&partial, path).await?;
    Ok(())
}
