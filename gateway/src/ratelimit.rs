//! Per-device sliding-window rate limiting over a compare-and-swap store.
//!
//! Each check runs one atomic transaction: load the record, drop timestamps
//! that fell out of the trailing window, append the current request, write
//! back conditioned on the version seen at load. Two simultaneous requests
//! for the same key can therefore never both observe a stale under-limit
//! count — the loser's write is rejected and it retries against fresh state.

use std::time::Duration;

use clap::ValueEnum;

use crate::store::{RateRecord, RateStore, StoreError};

/// Bounded optimistic retries before the transaction counts as contended.
const MAX_CAS_ATTEMPTS: u32 = 8;

/// Stored history is capped at `max_requests` plus this slack so a sustained
/// flood cannot grow a record without bound.
const HISTORY_SLACK: usize = 8;

/// Per-call-site limit: at most `max_requests` in any trailing
/// `window_secs` span.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub max_requests: u32,
    pub window_secs: u64,
}

/// What to do when the store cannot commit a transaction. Fail-open trades
/// abuse-resistance for availability; the choice is configuration, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailPolicy {
    FailOpen,
    FailClosed,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub allowed: bool,
    /// When blocked: ms until the window's oldest entry expires and a slot
    /// frees up. Absent when the store failed and policy decided.
    pub time_left_ms: Option<u64>,
}

impl Decision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            time_left_ms: None,
        }
    }

    fn blocked(time_left_ms: Option<u64>) -> Self {
        Self {
            allowed: false,
            time_left_ms,
        }
    }
}

pub struct RateLimiter<S> {
    store: S,
    policy: FailPolicy,
}

impl<S: RateStore> RateLimiter<S> {
    pub fn new(store: S, policy: FailPolicy) -> Self {
        Self { store, policy }
    }

    /// Record an attempt for `(namespace, identifier)` at `now_ms` and decide
    /// admission. The clock is an argument so tests can simulate time.
    pub fn check(&self, quota: Quota, namespace: &str, identifier: &str, now_ms: u64) -> Decision {
        match self.try_check(quota, namespace, identifier, now_ms) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(namespace, identifier, error = %e, policy = ?self.policy,
                    "rate-limit store failure");
                match self.policy {
                    FailPolicy::FailOpen => Decision::allowed(),
                    FailPolicy::FailClosed => Decision::blocked(None),
                }
            }
        }
    }

    /// Prune records idle since before `cutoff_ms`.
    pub fn sweep(&self, cutoff_ms: u64) {
        self.store.sweep(cutoff_ms);
    }

    fn try_check(
        &self,
        quota: Quota,
        namespace: &str,
        identifier: &str,
        now_ms: u64,
    ) -> Result<Decision, StoreError> {
        let key = format!("rate:{namespace}:{identifier}");
        let window_ms = quota.window_secs * 1000;
        let window_start = now_ms.saturating_sub(window_ms);

        for attempt in 0..MAX_CAS_ATTEMPTS {
            if attempt > 0 {
                std::thread::sleep(Duration::from_micros(100 << attempt.min(4)));
            }

            let (mut record, version) = match self.store.load(&key)? {
                Some((record, version)) => (record, Some(version)),
                None => (RateRecord::default(), None),
            };

            record.timestamps.retain(|&t| t > window_start);
            record.timestamps.push(now_ms);
            let cap = quota.max_requests as usize + HISTORY_SLACK;
            if record.timestamps.len() > cap {
                let excess = record.timestamps.len() - cap;
                record.timestamps.drain(..excess);
            }
            record.last_request = now_ms;

            let count = record.timestamps.len();
            let oldest = record.timestamps.first().copied();

            if self.store.store(&key, version, record)? {
                if count <= quota.max_requests as usize {
                    return Ok(Decision::allowed());
                }
                let time_left_ms = oldest.map(|o| (o + window_ms).saturating_sub(now_ms));
                return Ok(Decision::blocked(time_left_ms));
            }
            // Lost the CAS race; reload and try again.
        }

        Err(StoreError::Contended(MAX_CAS_ATTEMPTS))
    }
}
