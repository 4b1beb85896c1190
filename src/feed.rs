// src/feed.rs
//! RSS transport: fetch a feed URL over HTTP and decode it into raw items.
//! Sits behind the [`FeedTransport`] trait so the pipeline never knows about
//! feed formats; tests drive the decoder straight from fixture strings.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::traits::{FeedError, FeedTransport};
use crate::types::RawItem;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "content:encoded", alias = "encoded")]
    content: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|unix| Utc.timestamp_opt(unix, 0).single())
}

pub struct HttpFeedTransport {
    client: reqwest::Client,
}

impl HttpFeedTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Decode an RSS 2.0 document. Items with no usable date get the fetch
    /// time, so downstream ordering never sees a hole.
    pub fn parse_str(xml: &str) -> Result<Vec<RawItem>, FeedError> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss =
            from_str(&xml_clean).map_err(|e| FeedError::Malformed(e.to_string()))?;

        let fetched_at = Utc::now();
        let items = rss
            .channel
            .item
            .into_iter()
            .map(|it| RawItem {
                title: it.title.unwrap_or_default(),
                description: it.description.unwrap_or_default(),
                link: it.link.unwrap_or_default(),
                author: it.author.unwrap_or_default(),
                published_at: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_rfc2822)
                    .or(Some(fetched_at)),
                body: it.content,
            })
            .collect();
        Ok(items)
    }
}

impl Default for HttpFeedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedTransport for HttpFeedTransport {
    async fn parse(&self, url: &str) -> Result<Vec<RawItem>, FeedError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;
        let resp = resp
            .error_for_status()
            .map_err(|e| FeedError::Http(e.to_string()))?;
        let body = resp
            .text()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;
        Self::parse_str(&body)
    }
}

/// Bare named entities are legal in HTML but not in XML; scrub the common
/// ones before handing the document to the XML decoder.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
