//! Shared gateway state.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::ratelimit::RateLimiter;
use crate::store::MemoryStore;

/// Everything request handling needs: config plus the rate limiter. Token
/// verification is stateless, so this is the only state the gateway holds.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub limiter: RateLimiter<MemoryStore>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        let limiter = RateLimiter::new(MemoryStore::new(), config.store_failure);
        Self { config, limiter }
    }
}

pub type SharedState = Arc<GatewayState>;
