// src/types.rs
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One configured feed. Owned by the configuration API; the pipeline only
/// ever writes `last_fetch_time`, once per completed fetch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Source {
    pub id: i64,
    pub platform: String,
    pub url: String,
    pub author_name: String,
    /// Informational ordering only; not used to reorder or rate-limit.
    pub priority: i32,
    pub fetch_interval_secs: u64,
    pub enabled: bool,
    pub last_fetch_time: Option<DateTime<Utc>>,
}

impl Source {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }
}

/// One entry as it came out of the feed decoder. Exists only within a fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
}

/// A RawItem after sanitization: trimmed title, HTML-stripped body capped at
/// 5000 chars, URL without query/fragment. Sanitizing again is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
    pub title: String,
    pub body: String,
    pub url: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Processing state of a persisted item. `Pending` until the record has been
/// handed to the evaluation queue; terminal states are owned downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    Pending,
    Processing,
    Evaluated,
    Discarded,
}

/// What the pipeline asks the content store to persist for a novel item.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub source_id: i64,
    pub platform: String,
    pub author_name: String,
    pub title: String,
    pub url: String,
    pub fingerprint: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// The durable record the content store hands back after a create.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct IngestedContent {
    pub id: i64,
    pub source_id: i64,
    pub platform: String,
    pub author_name: String,
    pub title: String,
    pub url: String,
    pub fingerprint: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub ingested_at: DateTime<Utc>,
    pub status: ContentStatus,
}

/// JSON payload pushed onto the outbound evaluation queue.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct StreamMessage {
    pub content_id: i64,
    pub title: String,
    pub url: String,
    pub body: String,
    pub fingerprint: String,
    pub platform: String,
    pub author_name: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl StreamMessage {
    pub fn from_content(c: &IngestedContent) -> Self {
        Self {
            content_id: c.id,
            title: c.title.clone(),
            url: c.url.clone(),
            body: c.body.clone(),
            fingerprint: c.fingerprint.clone(),
            platform: c.platform.clone(),
            author_name: c.author_name.clone(),
            published_at: c.published_at,
        }
    }
}
