//! Developer feedback: fire-and-forget telemetry POSTs. No retries, no
//! ordering; a failed send is logged and forgotten.

use aria_core::{settings, Store};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_ENDPOINT: &str = "https://api.example.com/developer";

pub struct DeveloperFeedback {
    store: Arc<dyn Store>,
    client: Client,
}

impl DeveloperFeedback {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            client: Client::new(),
        }
    }

    fn setting_or(&self, key: &str, default: &str) -> String {
        match self.store.setting(key) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(e) => {
                warn!(key, error = %e, "setting lookup failed");
                default.to_string()
            }
        }
    }

    fn endpoint(&self) -> String {
        self.setting_or(settings::DEVELOPER_ENDPOINT, DEFAULT_ENDPOINT)
    }

    fn payload(&self, kind: &str, content: Value) -> Value {
        json!({
            "type": kind,
            "content": content,
            "timestamp": Utc::now().to_rfc3339(),
            "version": self.setting_or(settings::VERSION, env!("CARGO_PKG_VERSION")),
            "instance_id": self.setting_or(settings::INSTANCE_ID, "unknown"),
        })
    }

    /// Send one feedback message. Returns whether the endpoint accepted it;
    /// failures are logged, never retried.
    pub async fn send_feedback(&self, kind: &str, content: Value) -> bool {
        let endpoint = self.endpoint();
        let payload = self.payload(kind, content);
        match self
            .client
            .post(&endpoint)
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(kind, "feedback sent");
                true
            }
            Ok(response) => {
                warn!(kind, status = %response.status(), "feedback rejected");
                false
            }
            Err(e) => {
                warn!(kind, error = %e, "feedback send failed");
                false
            }
        }
    }

    pub async fn send_error_report(
        &self,
        error_type: &str,
        message: &str,
        detail: Option<&str>,
    ) -> bool {
        self.send_feedback(
            "error_report",
            json!({
                "error_type": error_type,
                "error_message": message,
                "detail": detail,
            }),
        )
        .await
    }

    pub async fn send_usage_statistics(&self, stats: Value) -> bool {
        self.send_feedback("usage_statistics", stats).await
    }

    /// Ask the developer endpoint whether a newer version exists. Returns
    /// the reply body only when it reports updates.
    pub async fn check_for_updates(&self) -> Option<Value> {
        let endpoint = format!("{}/updates", self.endpoint());
        let payload = json!({
            "action": "check_updates",
            "current_version": self.setting_or(settings::VERSION, env!("CARGO_PKG_VERSION")),
            "instance_id": self.setting_or(settings::INSTANCE_ID, "unknown"),
        });
        let response = match self
            .client
            .post(&endpoint)
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "update check rejected");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "update check failed");
                return None;
            }
        };
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "update check reply unreadable");
                return None;
            }
        };
        if body.get("has_updates").and_then(|v| v.as_bool()).unwrap_or(false) {
            info!(latest = ?body.get("latest_version"), "updates available");
            Some(body)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::MemoryStore;

    #[test]
    fn payload_carries_identity_from_settings() {
        let store = Arc::new(MemoryStore::new());
        store.set_setting(settings::VERSION, "2.1.0").unwrap();
        store.set_setting(settings::INSTANCE_ID, "aria-west").unwrap();
        let feedback = DeveloperFeedback::new(store);

        let payload = feedback.payload("error_report", json!({"e": 1}));
        assert_eq!(payload["type"], json!("error_report"));
        assert_eq!(payload["version"], json!("2.1.0"));
        assert_eq!(payload["instance_id"], json!("aria-west"));
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn payload_defaults_when_settings_missing() {
        let feedback = DeveloperFeedback::new(Arc::new(MemoryStore::new()));
        let payload = feedback.payload("usage_statistics", json!({}));
        assert_eq!(payload["version"], json!(env!("CARGO_PKG_VERSION")));
        assert_eq!(payload["instance_id"], json!("unknown"));
    }

    #[test]
    fn endpoint_read_from_settings_with_default() {
        let store = Arc::new(MemoryStore::new());
        let feedback = DeveloperFeedback::new(store.clone());
        assert_eq!(feedback.endpoint(), DEFAULT_ENDPOINT);

        store
            .set_setting(settings::DEVELOPER_ENDPOINT, "https://dev.example/feedback")
            .unwrap();
        assert_eq!(feedback.endpoint(), "https://dev.example/feedback");
    }
}
