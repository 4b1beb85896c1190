//! Feedgate — Binary Entrypoint
//! Runs the ingestion pipeline against in-memory stores with a real HTTP
//! feed transport: seed sources from a TOML file, start the cycle loop,
//! drain cleanly on ctrl-c.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedgate::config::{load_seed_sources, IngestConfig};
use feedgate::feed::HttpFeedTransport;
use feedgate::memory::{
    MemoryContentStore, MemoryDedupCache, MemoryPublisher, MemorySourceStore,
};
use feedgate::orchestrator::Ingestor;

const ENV_SOURCES_PATH: &str = "FEEDGATE_SOURCES_PATH";
const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedgate=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = IngestConfig::from_env().context("loading ingest config")?;

    let sources_path = std::env::var(ENV_SOURCES_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCES_PATH));
    let seed = load_seed_sources(&sources_path)
        .with_context(|| format!("seeding sources from {}", sources_path.display()))?;
    tracing::info!(sources = seed.len(), workers = cfg.worker_count, "starting feedgate");

    let source_store = Arc::new(MemorySourceStore::new(seed));
    let content_store = Arc::new(MemoryContentStore::new());
    let publisher = Arc::new(MemoryPublisher::new());

    let ingestor = Ingestor::new(
        &cfg,
        source_store.clone(),
        Arc::new(HttpFeedTransport::new()),
        Arc::new(MemoryDedupCache::new()),
        content_store.clone(),
        publisher.clone(),
    );

    ingestor.start().await;

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutdown requested, draining");
    ingestor.stop().await;

    tracing::info!(
        persisted = content_store.records().len(),
        published = publisher.published().len(),
        "feedgate stopped"
    );
    Ok(())
}
