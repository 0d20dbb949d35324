//! Interval token derivation — the codec shared by client and gateway.
//!
//! A token is `HMAC-SHA256(key = secret, message = "{interval}{secret}")`,
//! hex-encoded, where `interval = floor(adjusted_unix_seconds / interval_secs)`.
//! The secret appears both as the HMAC key and at the tail of the message;
//! that doubling is a fixed protocol constant. Changing the byte layout on
//! one side breaks interoperability silently — tokens simply never match.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::ProtoError;

type HmacSha256 = Hmac<Sha256>;

/// The shared secret, provisioned out-of-band and identical on both sides.
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Result<Self, ProtoError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ProtoError::EmptySecret);
        }
        Ok(Self(Zeroizing::new(value)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(redacted)")
    }
}

/// Interval length and drift tolerance, agreed between client and gateway.
#[derive(Debug, Clone, Copy)]
pub struct TokenScheme {
    interval_secs: u64,
    tolerance: u32,
}

impl TokenScheme {
    pub const DEFAULT_INTERVAL_SECS: u64 = 10;
    pub const DEFAULT_TOLERANCE: u32 = 2;

    pub fn new(interval_secs: u64, tolerance: u32) -> Result<Self, ProtoError> {
        if interval_secs == 0 {
            return Err(ProtoError::ZeroInterval);
        }
        Ok(Self {
            interval_secs,
            tolerance,
        })
    }

    /// Compute the interval containing `unix_seconds`.
    pub fn interval_for(&self, unix_seconds: u64) -> u64 {
        unix_seconds / self.interval_secs
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Accepted drift either side of the current interval, in intervals.
    pub fn tolerance(&self) -> i64 {
        i64::from(self.tolerance)
    }
}

impl Default for TokenScheme {
    fn default() -> Self {
        Self {
            interval_secs: Self::DEFAULT_INTERVAL_SECS,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Derive the hex token for a given interval. Pure and deterministic.
pub fn derive_token(secret: &Secret, interval: u64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(interval.to_string().as_bytes());
    mac.update(secret.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a presented hex token against one interval.
pub fn verify_interval_token(secret: &Secret, interval: u64, presented: &str) -> bool {
    let Ok(presented_bytes) = hex::decode(presented) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(interval.to_string().as_bytes());
    mac.update(secret.as_bytes());
    mac.verify_slice(&presented_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Secret {
        Secret::new("s3cr3t").unwrap()
    }

    #[test]
    fn same_interval_same_token() {
        assert_eq!(derive_token(&secret(), 100), derive_token(&secret(), 100));
    }

    #[test]
    fn different_interval_different_token() {
        assert_ne!(derive_token(&secret(), 100), derive_token(&secret(), 101));
    }

    #[test]
    fn different_secret_different_token() {
        let other = Secret::new("other").unwrap();
        assert_ne!(derive_token(&secret(), 100), derive_token(&other, 100));
    }

    #[test]
    fn message_layout_is_interval_then_secret() {
        // Pin the exact byte layout: message = "100s3cr3t", key = "s3cr3t".
        let mut mac = HmacSha256::new_from_slice(b"s3cr3t").unwrap();
        mac.update(b"100s3cr3t");
        let expected = hex::encode(mac.finalize().into_bytes());
        assert_eq!(derive_token(&secret(), 100), expected);
    }

    #[test]
    fn verify_accepts_derived_token() {
        let token = derive_token(&secret(), 42);
        assert!(verify_interval_token(&secret(), 42, &token));
    }

    #[test]
    fn verify_rejects_wrong_interval_and_garbage() {
        let token = derive_token(&secret(), 42);
        assert!(!verify_interval_token(&secret(), 43, &token));
        assert!(!verify_interval_token(&secret(), 42, "deadbeef"));
        assert!(!verify_interval_token(&secret(), 42, "not hex at all"));
    }

    #[test]
    fn interval_math() {
        let scheme = TokenScheme::new(10, 2).unwrap();
        assert_eq!(scheme.interval_for(1000), 100);
        assert_eq!(scheme.interval_for(1009), 100);
        assert_eq!(scheme.interval_for(1010), 101);
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(TokenScheme::new(0, 2).is_err());
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(Secret::new("").is_err());
    }

    #[test]
    fn secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", secret()), "Secret(redacted)");
    }
}
