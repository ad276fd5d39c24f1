//! The background scheduler: one task, one cycle shape. Each cycle runs the
//! source refresh pass, the peer health pass, and the update apply pass;
//! a failing pass is logged and the cycle moves on.

use crate::sources::SourceSyncEngine;
use crate::updates::UpdatePipeline;
use aria_federation::PeerRegistry;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Scheduler {
    sources: Arc<SourceSyncEngine>,
    peers: Arc<PeerRegistry>,
    updates: Arc<UpdatePipeline>,
    config: SchedulerConfig,
    running: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl Scheduler {
    pub fn new(
        sources: Arc<SourceSyncEngine>,
        peers: Arc<PeerRegistry>,
        updates: Arc<UpdatePipeline>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            sources,
            peers,
            updates,
            config,
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().expect("scheduler lock").is_some()
    }

    /// Spawn the cycle loop. Idempotent: a second start is a warning, not a
    /// second loop.
    pub fn start(&self) {
        let mut running = self.running.lock().expect("scheduler lock");
        if running.is_some() {
            warn!("scheduler already running");
            return;
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let sources = self.sources.clone();
        let peers = self.peers.clone();
        let updates = self.updates.clone();
        let interval = self.config.interval;

        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = sources.run_pass().await {
                    error!(error = %e, "source sync pass failed");
                }
                if let Err(e) = peers.health_check_all().await {
                    error!(error = %e, "peer health pass failed");
                }
                if let Err(e) = updates.apply_pending().await {
                    error!(error = %e, "update apply pass failed");
                }

                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("scheduler loop exited");
        });

        *running = Some((token, handle));
        info!("scheduler started");
    }

    /// Cancel the loop and wait for the task, bounded. In-flight network
    /// calls inside the current cycle are not interrupted; only the
    /// inter-cycle sleep is.
    pub async fn stop(&self) {
        let Some((token, handle)) = self.running.lock().expect("scheduler lock").take() else {
            warn!("scheduler not running");
            return;
        };
        token.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(Ok(())) => info!("scheduler stopped"),
            Ok(Err(e)) => error!(error = %e, "scheduler task panicked"),
            Err(_) => warn!("scheduler did not stop within the timeout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::MemoryStore;
    use aria_federation::{FederationResult, PeerTransport};
    use serde_json::Value;

    struct NullTransport;

    #[async_trait::async_trait]
    impl PeerTransport for NullTransport {
        async fn post(
            &self,
            _endpoint: &str,
            _credential: Option<&str>,
            _payload: &Value,
            _timeout: Duration,
        ) -> FederationResult<Value> {
            Ok(Value::Null)
        }
    }

    fn scheduler(interval: Duration) -> Scheduler {
        let store = Arc::new(MemoryStore::new());
        let sources = Arc::new(SourceSyncEngine::new(store.clone()));
        let peers = Arc::new(
            PeerRegistry::new(store.clone(), Arc::new(NullTransport)).unwrap(),
        );
        let updates = Arc::new(UpdatePipeline::new(store));
        Scheduler::new(sources, peers, updates, SchedulerConfig { interval })
    }

    #[tokio::test]
    async fn start_and_stop_round_trip() {
        let scheduler = scheduler(Duration::from_millis(20));
        assert!(!scheduler.is_running());

        scheduler.start();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn double_start_keeps_one_loop() {
        let scheduler = scheduler(Duration::from_millis(20));
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let scheduler = scheduler(Duration::from_millis(20));
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn stop_takes_effect_mid_sleep() {
        let scheduler = scheduler(Duration::from_secs(3600));
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stopped = tokio::time::timeout(Duration::from_secs(2), scheduler.stop()).await;
        assert!(stopped.is_ok());
    }
}
