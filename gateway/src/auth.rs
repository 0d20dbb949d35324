//! Token verification with drift tolerance.
//!
//! A token matching the current interval is valid. A token matching a
//! neighboring interval within the tolerance is still valid but flagged as
//! drifted, which pushes the client to resync instead of letting skew grow
//! until it falls outside the window entirely.

use driftgate_proto::token;
use driftgate_proto::{Secret, TokenScheme};

/// Outcome of verifying a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    pub clock_drift: bool,
}

/// Check `presented` against every interval within the tolerance window
/// around the interval containing `now_secs`.
pub fn verify_token(
    secret: &Secret,
    scheme: &TokenScheme,
    presented: &str,
    now_secs: u64,
) -> Verification {
    let current = scheme.interval_for(now_secs);
    for offset in -scheme.tolerance()..=scheme.tolerance() {
        let Some(interval) = current.checked_add_signed(offset) else {
            continue;
        };
        if token::verify_interval_token(secret, interval, presented) {
            return Verification {
                valid: true,
                clock_drift: offset != 0,
            };
        }
    }
    Verification {
        valid: false,
        clock_drift: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftgate_proto::token::derive_token;

    fn secret() -> Secret {
        Secret::new("s3cr3t").unwrap()
    }

    fn scheme() -> TokenScheme {
        TokenScheme::new(10, 2).unwrap()
    }

    #[test]
    fn exact_interval_is_valid_without_drift() {
        let token = derive_token(&secret(), 100);
        let v = verify_token(&secret(), &scheme(), &token, 1000);
        assert!(v.valid);
        assert!(!v.clock_drift);
    }

    #[test]
    fn tolerance_is_symmetric() {
        for k in -2i64..=2 {
            let interval = 100u64.checked_add_signed(k).unwrap();
            let token = derive_token(&secret(), interval);
            let v = verify_token(&secret(), &scheme(), &token, 1000);
            assert!(v.valid, "offset {k} should be accepted");
            assert_eq!(v.clock_drift, k != 0, "offset {k} drift flag");
        }
        for k in [-4i64, -3, 3, 4] {
            let interval = 100u64.checked_add_signed(k).unwrap();
            let token = derive_token(&secret(), interval);
            let v = verify_token(&secret(), &scheme(), &token, 1000);
            assert!(!v.valid, "offset {k} should be rejected");
        }
    }

    #[test]
    fn stale_token_drifts_then_expires() {
        // Token minted at unix second 1000 (interval 100).
        let token = derive_token(&secret(), 100);

        // Same interval on the server side: clean pass.
        let v = verify_token(&secret(), &scheme(), &token, 1005);
        assert_eq!(
            v,
            Verification {
                valid: true,
                clock_drift: false
            }
        );

        // One interval later: still valid, but drifted.
        let v = verify_token(&secret(), &scheme(), &token, 1012);
        assert_eq!(
            v,
            Verification {
                valid: true,
                clock_drift: true
            }
        );

        // Three intervals later: outside the tolerance, rejected.
        let v = verify_token(&secret(), &scheme(), &token, 1031);
        assert!(!v.valid);
    }

    #[test]
    fn wrong_secret_never_matches() {
        let other = Secret::new("other").unwrap();
        let token = derive_token(&other, 100);
        assert!(!verify_token(&secret(), &scheme(), &token, 1000).valid);
    }

    #[test]
    fn garbage_token_is_invalid() {
        let v = verify_token(&secret(), &scheme(), "not-a-token", 1000);
        assert!(!v.valid);
        assert!(!v.clock_drift);
    }
}
