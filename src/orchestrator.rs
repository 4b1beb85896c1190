// src/orchestrator.rs
//! Cycle driver and lifecycle. Collaborators are injected at construction;
//! there is no package-level state anywhere in the crate.

use anyhow::{anyhow, Result};
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::IngestConfig;
use crate::dedup::DedupEngine;
use crate::metrics::ensure_metrics_described;
use crate::pipeline::ItemPipeline;
use crate::pool::{CycleStats, FetchPool};
use crate::scheduler::select_due;
use crate::traits::{ContentStore, DedupCache, FeedTransport, Publisher, SourceStore};

struct Inner {
    sources: Arc<dyn SourceStore>,
    dedup: Arc<DedupEngine>,
    pool: FetchPool,
    cycle_interval: Duration,
}

impl Inner {
    /// One pass: list enabled sources, pick the due ones, fan out.
    async fn run_cycle(&self) -> CycleStats {
        let sources = match self.sources.list(true).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = ?e, "listing sources failed, skipping cycle");
                return CycleStats::default();
            }
        };

        let due = select_due(&sources, chrono::Utc::now());
        if due.is_empty() {
            return CycleStats::default();
        }

        tracing::info!(due = due.len(), total = sources.len(), "cycle start");
        let stats = self.pool.run(due).await;

        counter!("feedgate_cycles_total").increment(1);
        gauge!("feedgate_last_cycle_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            fetched = stats.fetched,
            abandoned = stats.abandoned,
            items = stats.items,
            novel = stats.novel,
            duplicates = stats.duplicates,
            "cycle done"
        );
        stats
    }
}

pub struct Ingestor {
    inner: Arc<Inner>,
    shutdown: watch::Sender<bool>,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Ingestor {
    pub fn new(
        cfg: &IngestConfig,
        sources: Arc<dyn SourceStore>,
        transport: Arc<dyn FeedTransport>,
        cache: Arc<dyn DedupCache>,
        content: Arc<dyn ContentStore>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        ensure_metrics_described();

        let dedup = Arc::new(DedupEngine::new(
            cache,
            cfg.expected_items,
            cfg.false_positive_rate,
        ));
        let pipeline = Arc::new(ItemPipeline::new(dedup.clone(), content, publisher));
        let pool = FetchPool::new(
            transport,
            sources.clone(),
            pipeline,
            cfg.worker_count,
            cfg.fetch_timeout,
            cfg.max_retries,
        );

        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                sources,
                dedup,
                pool,
                cycle_interval: cfg.cycle_interval,
            }),
            shutdown,
            handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Warm the dedup filter (best effort), run one immediate cycle, then
    /// tick forever until [`stop`](Self::stop).
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            tracing::warn!("ingestor already started");
            return;
        }

        self.inner.dedup.initialize().await;

        let inner = self.inner.clone();
        let mut shutdown = self.shutdown.subscribe();
        *handle = Some(tokio::spawn(async move {
            inner.run_cycle().await;

            let mut ticker = tokio::time::interval(inner.cycle_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // the immediate first tick; already ran above

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        // Not raced against shutdown: an in-flight cycle
                        // always drains before the loop exits.
                        inner.run_cycle().await;
                    }
                }
            }
            tracing::info!("ingest loop stopped");
        }));
    }

    /// Signal shutdown and join the loop. An in-flight cycle's workers finish
    /// first; in-flight network calls are not interrupted.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = ?e, "ingest loop join failed");
            }
        }
    }

    /// One scheduled pass, on demand.
    pub async fn run_cycle(&self) -> CycleStats {
        self.inner.run_cycle().await
    }

    /// Fetch a single source immediately, bypassing the due-check. May run
    /// concurrently with a scheduled cycle; the dedup layers absorb the
    /// overlap.
    pub async fn fetch_one(&self, source_id: i64) -> Result<CycleStats> {
        let source = self
            .inner
            .sources
            .get(source_id)
            .await?
            .ok_or_else(|| anyhow!("unknown source {source_id}"))?;
        Ok(self.inner.pool.fetch_source(&source).await)
    }
}
