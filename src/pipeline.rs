// src/pipeline.rs
//! Per-item path: sanitize -> fingerprint -> dedup gate -> persist ->
//! mark seen -> publish. Idempotent at-least-once from the caller's side:
//! re-processing the same logical item after a partial failure is safe.

use metrics::counter;
use std::sync::Arc;

use crate::dedup::DedupEngine;
use crate::sanitize::sanitize;
use crate::traits::{ContentStore, Publisher, StoreError};
use crate::types::{ContentStatus, NewContent, RawItem, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Persisted and handed downstream (or at least left recoverable).
    Novel,
    /// Dropped silently: gate hit or lost the insert race.
    Duplicate,
    /// Aborted by an unexpected collaborator error. Only this item dies;
    /// the cycle goes on.
    Failed,
}

pub struct ItemPipeline {
    dedup: Arc<DedupEngine>,
    content: Arc<dyn ContentStore>,
    publisher: Arc<dyn Publisher>,
}

impl ItemPipeline {
    pub fn new(
        dedup: Arc<DedupEngine>,
        content: Arc<dyn ContentStore>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            dedup,
            content,
            publisher,
        }
    }

    pub async fn process(&self, source: &Source, raw: &RawItem) -> ItemOutcome {
        counter!("feedgate_items_total").increment(1);

        let item = sanitize(raw);
        let (fp, dup) = match self.dedup.validate(&item.url, &item.title, &item.body).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, source = source.id, "dedup check failed, skipping item");
                return ItemOutcome::Failed;
            }
        };

        if dup {
            counter!("feedgate_duplicates_total").increment(1);
            return ItemOutcome::Duplicate;
        }

        let record = match self
            .content
            .create(NewContent {
                source_id: source.id,
                platform: source.platform.clone(),
                author_name: if item.author.is_empty() {
                    source.author_name.clone()
                } else {
                    item.author.clone()
                },
                title: item.title.clone(),
                url: item.url.clone(),
                fingerprint: fp.clone(),
                body: item.body.clone(),
                published_at: item.published_at,
            })
            .await
        {
            Ok(r) => r,
            Err(StoreError::Duplicate) => {
                // Someone else persisted this fingerprint first. Already
                // handled, not an error.
                tracing::debug!(source = source.id, fingerprint = %fp, "insert race lost, dropping");
                counter!("feedgate_duplicates_total").increment(1);
                return ItemOutcome::Duplicate;
            }
            Err(StoreError::Other(e)) => {
                tracing::warn!(error = ?e, source = source.id, "content create failed");
                return ItemOutcome::Failed;
            }
        };

        if let Err(e) = self.dedup.mark_seen(&fp).await {
            // The store already holds the record; the constraint covers us
            // until the cache write can happen on a later pass.
            tracing::warn!(error = ?e, fingerprint = %fp, "mark-seen failed");
        }

        match self.publisher.publish(&record).await {
            Ok(()) => {
                if let Err(e) = self.content.update_status(record.id, ContentStatus::Processing).await
                {
                    tracing::warn!(error = ?e, content = record.id, "status update failed");
                }
            }
            Err(e) => {
                // No rollback: the record stays Pending so a recovery sweep
                // can re-publish it.
                tracing::warn!(error = ?e, content = record.id, "publish failed, record left pending");
            }
        }

        counter!("feedgate_novel_total").increment(1);
        tracing::info!(content = record.id, source = source.id, title = %record.title, "ingested");
        ItemOutcome::Novel
    }
}
