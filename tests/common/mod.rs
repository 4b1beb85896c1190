// tests/common/mod.rs
// Shared fakes and builders for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use feedgate::traits::{FeedError, FeedTransport};
use feedgate::types::{RawItem, Source};

pub fn source(id: i64, url: &str, interval_secs: u64, last: Option<DateTime<Utc>>) -> Source {
    Source {
        id,
        platform: "rss".into(),
        url: url.into(),
        author_name: String::new(),
        priority: 5,
        fetch_interval_secs: interval_secs,
        enabled: true,
        last_fetch_time: last,
    }
}

pub fn item(title: &str, link: &str, body: &str) -> RawItem {
    RawItem {
        title: title.into(),
        description: body.into(),
        link: link.into(),
        author: String::new(),
        published_at: Some(Utc::now()),
        body: Some(body.into()),
    }
}

/// Scripted feed transport: per-URL queues of canned answers, consumed one
/// per parse call. An exhausted queue keeps answering with an empty feed.
pub struct ScriptedTransport {
    steps: Mutex<HashMap<String, VecDeque<Result<Vec<RawItem>, String>>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn ok(&self, url: &str, items: Vec<RawItem>) -> &Self {
        self.steps
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(Ok(items));
        self
    }

    pub fn fail(&self, url: &str, times: usize) -> &Self {
        let mut steps = self.steps.lock().unwrap();
        let q = steps.entry(url.into()).or_default();
        for _ in 0..times {
            q.push_back(Err("connection refused".into()));
        }
        self
    }

    /// Delay every answer for this URL (deadline tests).
    pub fn slow(&self, url: &str, delay: Duration) -> &Self {
        self.delays.lock().unwrap().insert(url.into(), delay);
        self
    }

    pub fn calls_for(&self, url: &str) -> usize {
        *self.calls.lock().unwrap().get(url).unwrap_or(&0)
    }
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    async fn parse(&self, url: &str) -> Result<Vec<RawItem>, FeedError> {
        *self.calls.lock().unwrap().entry(url.into()).or_insert(0) += 1;

        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front());
        match step {
            Some(Ok(items)) => Ok(items),
            Some(Err(msg)) => Err(FeedError::Http(msg)),
            None => Ok(Vec::new()),
        }
    }
}
