//! ariad — the background integration daemon: keeps the local knowledge and
//! update store synchronized with remote sources and peers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use aria_core::MemoryStore;
use aria_federation::{HttpPeerTransport, PeerRegistry};
use aria_llm::ProviderGateway;
use aria_sync::{Scheduler, SchedulerConfig, SourceSyncEngine, UpdatePipeline};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ariad", about = "Aria background integration daemon")]
struct Cli {
    /// Seconds between scheduler cycles
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Tracing filter (overridden by RUST_LOG)
    #[arg(long, default_value = "aria=info")]
    log_filter: String,

    /// Also write logs to daily files in this directory
    #[arg(long)]
    log_dir: Option<std::path::PathBuf>,

    /// Skip seeding the default data sources into an empty registry
    #[arg(long, default_value_t = false)]
    no_default_sources: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_filter.clone().into());
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    // The appender guard must outlive the subscriber or buffered lines are lost.
    let _file_guard = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ariad.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    };

    let store = Arc::new(MemoryStore::new());

    let gateway = ProviderGateway::new(store.clone());
    tracing::info!(
        providers = ?gateway.default_targets(),
        "provider gateway ready"
    );
    let peers = Arc::new(
        PeerRegistry::new(store.clone(), Arc::new(HttpPeerTransport::new()))
            .context("building peer registry")?,
    );

    let sources = Arc::new(SourceSyncEngine::new(store.clone()));
    if !cli.no_default_sources {
        sources
            .seed_defaults()
            .context("seeding default data sources")?;
    }
    let updates = Arc::new(UpdatePipeline::new(store));

    let scheduler = Scheduler::new(
        sources,
        peers,
        updates,
        SchedulerConfig {
            interval: Duration::from_secs(cli.interval),
        },
    );

    scheduler.start();
    tracing::info!(interval_secs = cli.interval, "ariad running, ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutdown requested");
    scheduler.stop().await;

    Ok(())
}
