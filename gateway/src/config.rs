//! Gateway configuration.

use clap::Parser;
use driftgate_proto::{ProtoError, Secret, TokenScheme};

use crate::ratelimit::{FailPolicy, Quota};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "driftgate-gateway",
    about = "Request authentication and rate limiting gateway"
)]
pub struct GatewayArgs {
    /// Address to bind (e.g. "0.0.0.0:8080")
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Shared secret for token derivation. Must match the clients.
    #[arg(long, env = "DRIFTGATE_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Token interval length in seconds.
    #[arg(long, default_value = "10")]
    pub interval_secs: u64,

    /// Accepted drift either side of the current interval, in intervals.
    #[arg(long, default_value = "2")]
    pub tolerance: u32,

    /// Behavior when the rate-limit store cannot commit.
    #[arg(long, value_enum, default_value = "fail-open")]
    pub store_failure: FailPolicy,

    /// Max requests per device within the ping route window.
    #[arg(long, default_value = "30")]
    pub ping_max_requests: u32,

    /// Ping route window size in seconds.
    #[arg(long, default_value = "60")]
    pub ping_window_secs: u64,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Parsed configuration used throughout the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: String,
    pub secret: Secret,
    pub scheme: TokenScheme,
    pub store_failure: FailPolicy,
    pub ping_quota: Quota,
    pub log_level: String,
}

impl TryFrom<GatewayArgs> for GatewayConfig {
    type Error = ProtoError;

    fn try_from(args: GatewayArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            bind: args.bind,
            secret: Secret::new(args.secret)?,
            scheme: TokenScheme::new(args.interval_secs, args.tolerance)?,
            store_failure: args.store_failure,
            ping_quota: Quota {
                max_requests: args.ping_max_requests,
                window_secs: args.ping_window_secs,
            },
            log_level: args.log_level,
        })
    }
}
