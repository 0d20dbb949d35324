//! HTTP wire contract — header names, error codes, and JSON bodies.
//!
//! Error responses carry a JSON body `{ "error": ..., "code": ... }`; rate
//! limit responses additionally carry a `timeLeft` object and a
//! `Retry-After` header.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Request header names (client → gateway).
pub mod headers {
    /// Hex HMAC token for the current interval.
    pub const APP_SECRET: &str = "x-app-secret";
    /// Client-generated opaque installation identifier.
    pub const DEVICE_ID: &str = "x-device-id";
    /// Informational client platform tag.
    pub const PLATFORM: &str = "x-platform";
    /// Optional locale hint, consumed by business handlers only.
    pub const LOCALE: &str = "x-locale";
}

/// Error code constants (gateway → client).
pub mod codes {
    pub const MISSING_APP_SECRET: &str = "MISSING_APP_SECRET";
    pub const INVALID_APP_SECRET: &str = "INVALID_APP_SECRET";
    pub const CLOCK_DRIFT: &str = "CLOCK_DRIFT";
    pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
    pub const DEVICE_VERIFICATION_FAILED: &str = "DEVICE_VERIFICATION_FAILED";
}

/// Structured error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(rename = "timeLeft", skip_serializing_if = "Option::is_none")]
    pub time_left: Option<TimeLeft>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            time_left: None,
        }
    }

    pub fn with_time_left(mut self, time_left: TimeLeft) -> Self {
        self.time_left = Some(time_left);
        self
    }

    pub fn to_json(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Actionable retry-after guidance, rounded up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeLeft {
    pub seconds: u64,
    pub minutes: u64,
}

impl TimeLeft {
    pub fn from_ms(ms: u64) -> Self {
        Self {
            seconds: ms.div_ceil(1000),
            minutes: ms.div_ceil(60_000),
        }
    }
}

/// Body of the unauthenticated server-time endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    /// Milliseconds since the Unix epoch.
    pub server_time: i64,
}
