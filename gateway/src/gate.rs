//! Edge guards — the token check and the per-route rate limit.
//!
//! Both run before any business handler. Order matters: the token guard is
//! outermost, then device identity plus rate limiting, so a handler only
//! ever sees requests that passed both.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use driftgate_proto::wire::{codes, headers, ErrorBody, TimeLeft};

use crate::auth;
use crate::ratelimit::{Decision, Quota};
use crate::state::SharedState;

/// Reject requests without a valid interval token.
pub async fn require_token(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(presented) = header_str(&req, headers::APP_SECRET) else {
        return reject(
            StatusCode::UNAUTHORIZED,
            codes::MISSING_APP_SECRET,
            "no app secret header presented",
        );
    };

    let verification = auth::verify_token(
        &state.config.secret,
        &state.config.scheme,
        presented,
        unix_now_secs(),
    );

    if !verification.valid {
        return reject(
            StatusCode::UNAUTHORIZED,
            codes::INVALID_APP_SECRET,
            "app secret did not match any tolerated interval",
        );
    }

    if verification.clock_drift {
        // Valid but minted in a neighboring interval. Not serviced on this
        // pass; the client resyncs its clock and resubmits.
        return reject(
            StatusCode::CONFLICT,
            codes::CLOCK_DRIFT,
            "token interval is outside the current window, resync required",
        );
    }

    next.run(req).await
}

/// Enforce `quota` for the device presented in the request headers.
///
/// A request without a device id is rejected outright rather than bucketed
/// under a shared anonymous key — the store is never touched for it.
pub async fn enforce_quota(
    state: SharedState,
    namespace: &'static str,
    quota: Quota,
    req: Request,
    next: Next,
) -> Response {
    let Some(device_id) = header_str(&req, headers::DEVICE_ID).filter(|id| !id.is_empty())
    else {
        return reject(
            StatusCode::FORBIDDEN,
            codes::DEVICE_VERIFICATION_FAILED,
            "no device identity presented",
        );
    };

    let decision = state
        .limiter
        .check(quota, namespace, device_id, unix_now_ms());

    if decision.allowed {
        next.run(req).await
    } else {
        too_many_requests(decision, quota)
    }
}

fn too_many_requests(decision: Decision, quota: Quota) -> Response {
    // Fail-closed decisions carry no measured time; fall back to the full
    // window as conservative guidance.
    let time_left_ms = decision.time_left_ms.unwrap_or(quota.window_secs * 1000);
    let time_left = TimeLeft::from_ms(time_left_ms);
    let retry_after = time_left.seconds.max(1);

    let body = ErrorBody::new("rate limit exceeded, retry later", codes::RATE_LIMIT_EXCEEDED)
        .with_time_left(time_left);

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

fn reject(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(ErrorBody::new(message, code))).into_response()
}

fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs()
}
