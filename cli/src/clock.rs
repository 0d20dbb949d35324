//! Gateway clock synchronization.
//!
//! The offset (`serverTime - localTime`, ms) is measured against the
//! unauthenticated time endpoint and applied to every local time read used
//! for token generation. Reads and writes race benignly: a slightly stale
//! offset at worst costs one extra resync cycle, so no lock is held.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use driftgate_proto::wire::ServerTime;

/// How often the background task re-measures the offset.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(60);

const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ClockSync {
    http: reqwest::Client,
    time_url: String,
    offset_ms: AtomicI64,
}

impl ClockSync {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SYNC_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            time_url: format!("{}/v1/time", base_url.trim_end_matches('/')),
            offset_ms: AtomicI64::new(0),
        })
    }

    /// Measure and store the offset. On failure the last-known offset stays
    /// in effect — stale but available beats blocking request issuance.
    pub async fn sync(&self) -> Result<()> {
        let resp = self
            .http
            .get(&self.time_url)
            .send()
            .await
            .context("failed to reach the server time endpoint")?;
        let body: ServerTime = resp
            .json()
            .await
            .context("invalid server time response")?;

        let offset = body.server_time - local_now_ms();
        self.offset_ms.store(offset, Ordering::Relaxed);
        tracing::debug!(offset_ms = offset, "clock offset updated");
        Ok(())
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::Relaxed)
    }

    /// Override the offset directly — for simulating skew without timers.
    pub fn set_offset_ms(&self, offset: i64) {
        self.offset_ms.store(offset, Ordering::Relaxed);
    }

    pub fn adjusted_now_ms(&self) -> i64 {
        local_now_ms() + self.offset_ms()
    }

    pub fn adjusted_now_secs(&self) -> u64 {
        (self.adjusted_now_ms() / 1000).max(0) as u64
    }
}

/// Periodically re-measure the offset to correct for drift accumulation.
/// Failures are logged and retried on the next tick.
pub fn spawn_resync(clock: Arc<ClockSync>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RESYNC_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = clock.sync().await {
                tracing::debug!("background resync failed: {e:#}");
            }
        }
    })
}

fn local_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as i64
}
