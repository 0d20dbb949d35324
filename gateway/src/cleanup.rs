//! Background pruning of idle rate-limit records.

use std::time::Duration;

use crate::gate;
use crate::state::SharedState;

const SWEEP_EVERY: Duration = Duration::from_secs(60);

/// Records idle for longer than this are dropped. Generous enough to outlive
/// any plausible window; expired timestamps inside live records are pruned
/// on every write anyway.
const RETENTION: Duration = Duration::from_secs(600);

pub async fn run_sweep_loop(state: SharedState) {
    let mut interval = tokio::time::interval(SWEEP_EVERY);

    loop {
        interval.tick().await;
        let cutoff = gate::unix_now_ms().saturating_sub(RETENTION.as_millis() as u64);
        state.limiter.sweep(cutoff);
    }
}
