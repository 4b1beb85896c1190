// src/config.rs
use anyhow::{ensure, Context, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::types::Source;

/// Tunables for the ingestion pipeline. Defaults match the production
/// deployment; every field can be overridden through `FEEDGATE_*` env vars.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Fixed worker count W for the fetch pool.
    pub worker_count: usize,
    /// Deadline for one source's whole fetch: shared across all retries.
    pub fetch_timeout: Duration,
    /// Sequential parse attempts per source per cycle.
    pub max_retries: u32,
    /// Scheduled cycle period.
    pub cycle_interval: Duration,
    /// Expected distinct-item cardinality used to size the membership filter.
    pub expected_items: usize,
    /// Target false-positive rate for the membership filter.
    pub false_positive_rate: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            fetch_timeout: Duration::from_secs(10),
            max_retries: 3,
            cycle_interval: Duration::from_secs(3600),
            expected_items: 1_000_000,
            false_positive_rate: 0.001,
        }
    }
}

impl IngestConfig {
    /// Defaults overlaid with environment overrides.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let cfg = Self {
            worker_count: env_or("FEEDGATE_WORKERS", d.worker_count)?,
            fetch_timeout: Duration::from_secs(env_or(
                "FEEDGATE_FETCH_TIMEOUT_SECS",
                d.fetch_timeout.as_secs(),
            )?),
            max_retries: env_or("FEEDGATE_MAX_RETRIES", d.max_retries)?,
            cycle_interval: Duration::from_secs(env_or(
                "FEEDGATE_CYCLE_INTERVAL_SECS",
                d.cycle_interval.as_secs(),
            )?),
            expected_items: env_or("FEEDGATE_EXPECTED_ITEMS", d.expected_items)?,
            false_positive_rate: env_or("FEEDGATE_FP_RATE", d.false_positive_rate)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.worker_count > 0, "worker_count must be positive");
        ensure!(self.max_retries > 0, "max_retries must be positive");
        ensure!(
            !self.cycle_interval.is_zero(),
            "cycle_interval must be positive"
        );
        ensure!(
            !self.fetch_timeout.is_zero(),
            "fetch_timeout must be positive"
        );
        ensure!(self.expected_items > 0, "expected_items must be positive");
        ensure!(
            self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("parsing {key}={v}")),
        Err(_) => Ok(default),
    }
}

/// Seed-source list for the demo binary. TOML, one `[[sources]]` table per
/// feed; `fetch_interval_secs` must be positive.
pub fn load_seed_sources(path: &Path) -> Result<Vec<Source>> {
    #[derive(serde::Deserialize)]
    struct SeedFile {
        sources: Vec<SeedSource>,
    }
    #[derive(serde::Deserialize)]
    struct SeedSource {
        url: String,
        #[serde(default = "default_platform")]
        platform: String,
        #[serde(default)]
        author_name: String,
        #[serde(default = "default_priority")]
        priority: i32,
        #[serde(default = "default_interval")]
        fetch_interval_secs: u64,
        #[serde(default = "default_enabled")]
        enabled: bool,
    }
    fn default_platform() -> String {
        "rss".to_string()
    }
    fn default_priority() -> i32 {
        5
    }
    fn default_interval() -> u64 {
        3600
    }
    fn default_enabled() -> bool {
        true
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let file: SeedFile = toml::from_str(&content).context("parsing sources toml")?;

    let mut out = Vec::with_capacity(file.sources.len());
    for (i, s) in file.sources.into_iter().enumerate() {
        ensure!(
            s.fetch_interval_secs > 0,
            "source {} has a zero fetch interval",
            s.url
        );
        out.push(Source {
            id: i as i64 + 1,
            platform: s.platform,
            url: s.url,
            author_name: s.author_name,
            priority: s.priority,
            fetch_interval_secs: s.fetch_interval_secs,
            enabled: s.enabled,
            last_fetch_time: None,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        IngestConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_interval_rejected() {
        let cfg = IngestConfig {
            cycle_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_apply() {
        std::env::set_var("FEEDGATE_WORKERS", "9");
        std::env::set_var("FEEDGATE_FETCH_TIMEOUT_SECS", "3");
        let cfg = IngestConfig::from_env().unwrap();
        assert_eq!(cfg.worker_count, 9);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
        std::env::remove_var("FEEDGATE_WORKERS");
        std::env::remove_var("FEEDGATE_FETCH_TIMEOUT_SECS");
    }

    #[serial_test::serial]
    #[test]
    fn garbage_env_is_an_error() {
        std::env::set_var("FEEDGATE_MAX_RETRIES", "lots");
        assert!(IngestConfig::from_env().is_err());
        std::env::remove_var("FEEDGATE_MAX_RETRIES");
    }

    #[test]
    fn seed_file_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        fs::write(
            &p,
            r#"
[[sources]]
url = "https://example.com/a.xml"
fetch_interval_secs = 1800

[[sources]]
url = "https://example.com/b.xml"
platform = "atom"
enabled = false
"#,
        )
        .unwrap();

        let sources = load_seed_sources(&p).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, 1);
        assert_eq!(sources[0].fetch_interval_secs, 1800);
        assert!(sources[0].enabled);
        assert_eq!(sources[1].platform, "atom");
        assert!(!sources[1].enabled);
    }

    #[test]
    fn zero_source_interval_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        fs::write(
            &p,
            "[[sources]]\nurl = \"https://example.com/a.xml\"\nfetch_interval_secs = 0\n",
        )
        .unwrap();
        assert!(load_seed_sources(&p).is_err());
    }
}
