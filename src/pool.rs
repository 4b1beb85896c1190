// src/pool.rs
//! Bounded fetch fan-out. A cycle pushes every due source onto a shared
//! queue; exactly `worker_count` tasks pull from it until it runs dry, and
//! `run` returns only after all of them have finished.

use metrics::{counter, histogram};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pipeline::{ItemOutcome, ItemPipeline};
use crate::traits::{FeedTransport, SourceStore};
use crate::types::Source;

/// What one cycle (or one on-demand fetch) did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Sources fetched and processed.
    pub fetched: usize,
    /// Sources given up on after the retry budget or the fetch deadline.
    pub abandoned: usize,
    pub items: usize,
    pub novel: usize,
    pub duplicates: usize,
    pub failed_items: usize,
}

impl CycleStats {
    fn absorb(&mut self, other: CycleStats) {
        self.fetched += other.fetched;
        self.abandoned += other.abandoned;
        self.items += other.items;
        self.novel += other.novel;
        self.duplicates += other.duplicates;
        self.failed_items += other.failed_items;
    }
}

#[derive(Clone)]
pub struct FetchPool {
    transport: Arc<dyn FeedTransport>,
    sources: Arc<dyn SourceStore>,
    pipeline: Arc<ItemPipeline>,
    worker_count: usize,
    fetch_timeout: Duration,
    max_retries: u32,
}

impl FetchPool {
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        sources: Arc<dyn SourceStore>,
        pipeline: Arc<ItemPipeline>,
        worker_count: usize,
        fetch_timeout: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            sources,
            pipeline,
            worker_count: worker_count.max(1),
            fetch_timeout,
            max_retries: max_retries.max(1),
        }
    }

    /// Fetch all given sources with bounded parallelism. Each source is
    /// handled by exactly one worker; returns after every worker has joined.
    pub async fn run(&self, due: Vec<Source>) -> CycleStats {
        if due.is_empty() {
            return CycleStats::default();
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(due)));
        let mut handles = Vec::with_capacity(self.worker_count);

        for worker in 0..self.worker_count {
            let pool = self.clone();
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                let mut stats = CycleStats::default();
                loop {
                    let next = queue.lock().expect("pool queue poisoned").pop_front();
                    let Some(source) = next else { break };
                    stats.absorb(pool.fetch_source(&source).await);
                }
                tracing::debug!(worker, fetched = stats.fetched, "worker drained");
                stats
            }));
        }

        let mut total = CycleStats::default();
        for handle in handles {
            match handle.await {
                Ok(stats) => total.absorb(stats),
                Err(e) => tracing::warn!(error = ?e, "fetch worker panicked"),
            }
        }
        total
    }

    /// Fetch one source under a single deadline that spans the whole retry
    /// loop and item processing; the budget does not reset per attempt.
    pub async fn fetch_source(&self, source: &Source) -> CycleStats {
        let t0 = Instant::now();
        let outcome = tokio::time::timeout(self.fetch_timeout, self.fetch_with_retries(source)).await;
        histogram!("feedgate_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match outcome {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                counter!("feedgate_sources_abandoned_total").increment(1);
                CycleStats {
                    abandoned: 1,
                    ..Default::default()
                }
            }
            Err(_) => {
                tracing::warn!(source = source.id, url = %source.url, "fetch deadline exceeded");
                counter!("feedgate_sources_abandoned_total").increment(1);
                CycleStats {
                    abandoned: 1,
                    ..Default::default()
                }
            }
        }
    }

    /// Sequential parse attempts; the first success processes the items and
    /// stamps `last_fetch_time`. Exhaustion leaves the source untouched so it
    /// comes up due again next cycle.
    async fn fetch_with_retries(&self, source: &Source) -> Option<CycleStats> {
        for attempt in 1..=self.max_retries {
            let items = match self.transport.parse(&source.url).await {
                Ok(items) => items,
                Err(e) => {
                    counter!("feedgate_fetch_errors_total").increment(1);
                    tracing::warn!(
                        attempt,
                        error = %e,
                        source = source.id,
                        url = %source.url,
                        "feed fetch failed"
                    );
                    continue;
                }
            };

            let mut stats = CycleStats {
                fetched: 1,
                ..Default::default()
            };
            for raw in &items {
                stats.items += 1;
                match self.pipeline.process(source, raw).await {
                    ItemOutcome::Novel => stats.novel += 1,
                    ItemOutcome::Duplicate => stats.duplicates += 1,
                    ItemOutcome::Failed => stats.failed_items += 1,
                }
            }

            // Unconditional once the parse succeeded, even if some items
            // failed to persist: the dedup gate absorbs the re-exposure.
            if let Err(e) = self
                .sources
                .update_last_fetch_time(source.id, chrono::Utc::now())
                .await
            {
                tracing::warn!(error = ?e, source = source.id, "last_fetch_time update failed");
            }

            tracing::info!(
                source = source.id,
                url = %source.url,
                items = stats.items,
                novel = stats.novel,
                "fetched"
            );
            return Some(stats);
        }

        tracing::warn!(
            source = source.id,
            url = %source.url,
            attempts = self.max_retries,
            "source abandoned for this cycle"
        );
        None
    }
}
