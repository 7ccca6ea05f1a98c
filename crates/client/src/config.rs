//! Store configuration.

use std::time::Duration;

use anyhow::Context;

/// Polling cadence used when none is configured (matches the dashboard's
/// historical 5s refresh).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Connection/config context for the remote store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// API base, no trailing slash.
    pub base_url: String,
    /// Base location for screenshot artifacts; task records only carry
    /// relative paths.
    pub artifact_base: Option<String>,
    pub poll_interval: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: strip_trailing_slash(base_url.into()),
            artifact_base: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Read configuration from the environment:
    /// `AUTOCART_API_URL` (required), `AUTOCART_ARTIFACT_BASE`,
    /// `AUTOCART_POLL_INTERVAL_MS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("AUTOCART_API_URL")
            .context("AUTOCART_API_URL is not set")?;
        let poll_interval = parse_interval(std::env::var("AUTOCART_POLL_INTERVAL_MS").ok())
            .context("AUTOCART_POLL_INTERVAL_MS must be a positive integer (milliseconds)")?;

        Ok(Self {
            base_url: strip_trailing_slash(base_url),
            artifact_base: std::env::var("AUTOCART_ARTIFACT_BASE").ok(),
            poll_interval,
        })
    }

    pub fn with_artifact_base(mut self, base: impl Into<String>) -> Self {
        self.artifact_base = Some(strip_trailing_slash(base.into()));
        self
    }

    /// Resolve a task's screenshot reference against the artifact base.
    pub fn screenshot_url(&self, rel: &str) -> String {
        match &self.artifact_base {
            Some(base) => format!("{}/{}", base, rel.trim_start_matches('/')),
            None => rel.to_string(),
        }
    }
}

fn strip_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

fn parse_interval(raw: Option<String>) -> anyhow::Result<Duration> {
    match raw {
        None => Ok(DEFAULT_POLL_INTERVAL),
        Some(raw) => {
            let ms: u64 = raw.trim().parse()?;
            anyhow::ensure!(ms > 0, "interval must be positive");
            Ok(Duration::from_millis(ms))
        }
    }
}
