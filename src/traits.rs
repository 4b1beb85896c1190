// src/traits.rs
//! Collaborator seams. Everything the pipeline needs from the outside world
//! comes in through one of these traits; `memory.rs` carries the in-memory
//! reference implementations used by tests and the demo binary.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::types::{ContentStatus, IngestedContent, NewContent, RawItem, Source};

/// Feed-source configuration, read-only here except for the fetch timestamp.
#[async_trait::async_trait]
pub trait SourceStore: Send + Sync {
    async fn list(&self, enabled_only: bool) -> Result<Vec<Source>>;
    async fn get(&self, id: i64) -> Result<Option<Source>>;
    async fn update_last_fetch_time(&self, id: i64, ts: DateTime<Utc>) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("http error fetching feed: {0}")]
    Http(String),
    #[error("malformed feed: {0}")]
    Malformed(String),
}

/// "Parse feed URL -> ordered sequence of raw items". The feed format itself
/// is this collaborator's problem.
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    async fn parse(&self, url: &str) -> Result<Vec<RawItem>, FeedError>;
}

/// Short-lived exact-match layer of the dedup engine. Keys are fingerprints;
/// entries expire on their own after the retention window.
#[async_trait::async_trait]
pub trait DedupCache: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    /// All currently-live keys. Only called once, at startup, to warm the
    /// membership filter.
    async fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store's uniqueness constraint rejected the fingerprint. Expected
    /// under concurrent writers; the caller treats it as a duplicate.
    #[error("duplicate fingerprint")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable item records. `create` is the third, authoritative dedup layer:
/// exactly one of two racing inserts for the same fingerprint succeeds.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn create(&self, item: NewContent) -> Result<IngestedContent, StoreError>;
    async fn update_status(&self, id: i64, status: ContentStatus) -> Result<()>;
}

/// Outbound queue toward the evaluation stage. No acknowledgement contract;
/// a failed publish leaves the record unpublished for a later sweep.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, content: &IngestedContent) -> Result<()>;
}
