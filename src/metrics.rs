// src/metrics.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on whatever exporter the
/// embedding service installs).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feedgate_cycles_total", "Completed fetch cycles.");
        describe_counter!("feedgate_items_total", "Raw items seen across all fetches.");
        describe_counter!("feedgate_novel_total", "Items persisted and handed downstream.");
        describe_counter!(
            "feedgate_duplicates_total",
            "Items dropped by the dedup gate or the store constraint."
        );
        describe_counter!(
            "feedgate_fetch_errors_total",
            "Feed fetch/parse attempts that failed."
        );
        describe_counter!(
            "feedgate_sources_abandoned_total",
            "Sources abandoned for a cycle after exhausting retries or the fetch deadline."
        );
        describe_histogram!("feedgate_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!("feedgate_last_cycle_ts", "Unix ts when the last cycle finished.");
    });
}
