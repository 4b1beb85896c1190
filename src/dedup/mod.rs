// src/dedup/mod.rs
//! Three-layer deduplication.
//!
//! Layer 1 is the in-process membership filter: allocation-free rejection of
//! the overwhelming majority of re-fetched items, never a false negative.
//! Layer 2 is the exact-match cache with a retention TTL: confirms a filter
//! hit or unmasks it as a false positive. Layer 3 is the content store's
//! uniqueness constraint, not consulted here; it catches whatever races
//! past the first two under concurrent writers.

pub mod bloom;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::fingerprint::fingerprint;
use crate::traits::DedupCache;
use bloom::BloomFilter;

/// How long a fingerprint is remembered by the exact-match layer.
pub const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub struct DedupEngine {
    filter: BloomFilter,
    cache: Arc<dyn DedupCache>,
    retention: Duration,
}

impl DedupEngine {
    pub fn new(cache: Arc<dyn DedupCache>, expected_items: usize, fp_rate: f64) -> Self {
        Self {
            filter: BloomFilter::with_rate(expected_items, fp_rate),
            cache,
            retention: RETENTION,
        }
    }

    /// Warm the membership filter from every currently-live cache entry.
    /// Best effort: a cache failure leaves the filter empty and is never
    /// fatal; the filter repopulates through normal `mark_seen` traffic.
    pub async fn initialize(&self) {
        match self.cache.keys().await {
            Ok(keys) => {
                let count = keys.len();
                for key in keys {
                    self.filter.insert(&key);
                }
                tracing::info!(entries = count, "dedup filter warmed from cache");
            }
            Err(e) => {
                tracing::warn!(error = ?e, "dedup cache unreachable, starting with empty filter");
            }
        }
    }

    /// Layered check. A filter miss is authoritative ("definitely new");
    /// a filter hit is confirmed or refuted by the exact cache lookup.
    pub async fn is_duplicate(&self, fp: &str) -> Result<bool> {
        if !self.filter.contains(fp) {
            return Ok(false);
        }
        self.cache.exists(fp).await
    }

    /// Record a fingerprint in both local layers.
    pub async fn mark_seen(&self, fp: &str) -> Result<()> {
        self.filter.insert(fp);
        self.cache.put_with_ttl(fp, "1", self.retention).await
    }

    /// Fingerprint + duplicate check in one call.
    pub async fn validate(&self, url: &str, title: &str, body: &str) -> Result<(String, bool)> {
        let fp = fingerprint(url, title, body);
        let dup = self.is_duplicate(&fp).await?;
        Ok((fp, dup))
    }
}
