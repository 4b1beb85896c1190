// src/scheduler.rs
//! Due-source selection. Pure function of the source set and the clock;
//! ordering of the result carries no meaning.

use chrono::{DateTime, Utc};

use crate::types::Source;

/// A source is due when it has never been fetched, or when strictly more
/// than its fetch interval has elapsed since the last successful fetch.
pub fn is_due(source: &Source, now: DateTime<Utc>) -> bool {
    match source.last_fetch_time {
        None => true,
        Some(last) => {
            let elapsed = (now - last).to_std().unwrap_or_default();
            elapsed > source.fetch_interval()
        }
    }
}

pub fn select_due(sources: &[Source], now: DateTime<Utc>) -> Vec<Source> {
    sources.iter().filter(|s| is_due(s, now)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn source(last: Option<DateTime<Utc>>) -> Source {
        Source {
            id: 1,
            platform: "rss".into(),
            url: "https://example.com/feed.xml".into(),
            author_name: String::new(),
            priority: 5,
            fetch_interval_secs: 3600,
            enabled: true,
            last_fetch_time: last,
        }
    }

    #[test]
    fn never_fetched_is_always_due() {
        assert!(is_due(&source(None), Utc::now()));
    }

    #[test]
    fn one_second_past_interval_is_due() {
        let now = Utc::now();
        let s = source(Some(now - Duration::seconds(3601)));
        assert!(is_due(&s, now));
    }

    #[test]
    fn one_second_short_of_interval_is_not_due() {
        let now = Utc::now();
        let s = source(Some(now - Duration::seconds(3599)));
        assert!(!is_due(&s, now));
    }

    #[test]
    fn exactly_on_the_interval_is_not_due() {
        let now = Utc::now();
        let s = source(Some(now - Duration::seconds(3600)));
        assert!(!is_due(&s, now));
    }

    #[test]
    fn future_timestamp_is_not_due() {
        let now = Utc::now();
        let s = source(Some(now + Duration::seconds(30)));
        assert!(!is_due(&s, now));
    }

    #[test]
    fn select_due_filters_without_mutating() {
        let now = Utc::now();
        let sources = vec![
            source(None),
            source(Some(now - Duration::seconds(10_000))),
            source(Some(now - Duration::seconds(10))),
        ];
        let due = select_due(&sources, now);
        assert_eq!(due.len(), 2);
        assert_eq!(sources.len(), 3);
    }
}
