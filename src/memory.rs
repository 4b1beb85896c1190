// src/memory.rs
//! In-memory collaborator implementations. These are the reference semantics
//! for the external stores the pipeline talks to: the demo binary runs on
//! them, the integration tests assert against them, and the content store
//! enforces the same fingerprint uniqueness a production database would.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::traits::{ContentStore, DedupCache, Publisher, SourceStore, StoreError};
use crate::types::{ContentStatus, IngestedContent, NewContent, Source, StreamMessage};

// --- sources ---

pub struct MemorySourceStore {
    inner: Mutex<Vec<Source>>,
}

impl MemorySourceStore {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            inner: Mutex::new(sources),
        }
    }

    pub fn snapshot(&self) -> Vec<Source> {
        self.inner.lock().expect("source store poisoned").clone()
    }
}

#[async_trait]
impl SourceStore for MemorySourceStore {
    async fn list(&self, enabled_only: bool) -> Result<Vec<Source>> {
        let v = self.inner.lock().expect("source store poisoned");
        Ok(v.iter()
            .filter(|s| !enabled_only || s.enabled)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Source>> {
        let v = self.inner.lock().expect("source store poisoned");
        Ok(v.iter().find(|s| s.id == id).cloned())
    }

    async fn update_last_fetch_time(&self, id: i64, ts: DateTime<Utc>) -> Result<()> {
        let mut v = self.inner.lock().expect("source store poisoned");
        match v.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.last_fetch_time = Some(ts);
                Ok(())
            }
            None => Err(anyhow!("unknown source {id}")),
        }
    }
}

// --- dedup cache ---

pub struct MemoryDedupCache {
    inner: Mutex<HashMap<String, (String, Instant)>>,
    unavailable: AtomicBool,
}

impl MemoryDedupCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate the cache being unreachable (startup-degradation paths).
    pub fn set_unavailable(&self, v: bool) {
        self.unavailable.store(v, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(anyhow!("cache unavailable"))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryDedupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupCache for MemoryDedupCache {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.check()?;
        let map = self.inner.lock().expect("cache poisoned");
        Ok(matches!(map.get(key), Some((_, dies)) if *dies > Instant::now()))
    }

    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check()?;
        let mut map = self.inner.lock().expect("cache poisoned");
        map.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.check()?;
        let map = self.inner.lock().expect("cache poisoned");
        let now = Instant::now();
        Ok(map
            .iter()
            .filter(|(_, (_, dies))| *dies > now)
            .map(|(k, _)| k.clone())
            .collect())
    }
}

// --- content store ---

#[derive(Default)]
struct ContentState {
    next_id: i64,
    records: Vec<IngestedContent>,
}

pub struct MemoryContentStore {
    inner: Mutex<ContentState>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ContentState::default()),
        }
    }

    pub fn records(&self) -> Vec<IngestedContent> {
        self.inner.lock().expect("content store poisoned").records.clone()
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn create(&self, item: NewContent) -> Result<IngestedContent, StoreError> {
        let mut state = self.inner.lock().expect("content store poisoned");
        // The uniqueness constraint: one record per fingerprint, ever.
        if state.records.iter().any(|r| r.fingerprint == item.fingerprint) {
            return Err(StoreError::Duplicate);
        }
        state.next_id += 1;
        let record = IngestedContent {
            id: state.next_id,
            source_id: item.source_id,
            platform: item.platform,
            author_name: item.author_name,
            title: item.title,
            url: item.url,
            fingerprint: item.fingerprint,
            body: item.body,
            published_at: item.published_at,
            ingested_at: Utc::now(),
            status: ContentStatus::Pending,
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_status(&self, id: i64, status: ContentStatus) -> Result<()> {
        let mut state = self.inner.lock().expect("content store poisoned");
        match state.records.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.status = status;
                Ok(())
            }
            None => Err(anyhow!("unknown content {id}")),
        }
    }
}

// --- publisher ---

pub struct MemoryPublisher {
    /// Raw JSON payloads, as they would land on the outbound stream.
    messages: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every publish fail (publish-failure recovery paths).
    pub fn set_failing(&self, v: bool) {
        self.fail.store(v, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<StreamMessage> {
        self.messages
            .lock()
            .expect("publisher poisoned")
            .iter()
            .map(|raw| serde_json::from_str(raw).expect("stream payload is json"))
            .collect()
    }
}

impl Default for MemoryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, content: &IngestedContent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("stream unavailable"));
        }
        let payload = serde_json::to_string(&StreamMessage::from_content(content))?;
        self.messages.lock().expect("publisher poisoned").push(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_entries_expire() {
        let cache = MemoryDedupCache::new();
        cache
            .put_with_ttl("k", "1", Duration::from_millis(10))
            .await
            .unwrap();
        assert!(cache.exists("k").await.unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!cache.exists("k").await.unwrap());
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn content_store_rejects_second_fingerprint() {
        let store = MemoryContentStore::new();
        let new = NewContent {
            source_id: 1,
            platform: "rss".into(),
            author_name: String::new(),
            title: "t".into(),
            url: "https://example.com".into(),
            fingerprint: "f".into(),
            body: "b".into(),
            published_at: None,
        };
        store.create(new.clone()).await.unwrap();
        assert!(matches!(
            store.create(new).await,
            Err(StoreError::Duplicate)
        ));
    }
}
