//! Secure-fetch behavior against a live in-process gateway.

use std::sync::Arc;

use reqwest::Method;

use driftgate_cli::clock::ClockSync;
use driftgate_cli::fetch::SecureClient;
use driftgate_gateway::config::GatewayConfig;
use driftgate_gateway::ratelimit::{FailPolicy, Quota};
use driftgate_gateway::server;
use driftgate_proto::wire::codes;
use driftgate_proto::{Secret, TokenScheme};

const TEST_SECRET: &str = "s3cr3t";
const TEST_INTERVAL_SECS: u64 = 600;

fn test_config() -> GatewayConfig {
    GatewayConfig {
        bind: "127.0.0.1:0".to_string(),
        secret: Secret::new(TEST_SECRET).unwrap(),
        scheme: TokenScheme::new(TEST_INTERVAL_SECS, 2).unwrap(),
        store_failure: FailPolicy::FailOpen,
        ping_quota: Quota {
            max_requests: 3,
            window_secs: 60,
        },
        log_level: "warn".into(),
    }
}

async fn boot() -> String {
    let (addr, _handle) = server::run_test(test_config()).await.unwrap();
    format!("http://{addr}")
}

fn make_client(base: &str, secret: &str, device_id: &str) -> (SecureClient, Arc<ClockSync>) {
    let clock = Arc::new(ClockSync::new(base).unwrap());
    let client = SecureClient::new(
        clock.clone(),
        Secret::new(secret).unwrap(),
        TokenScheme::new(TEST_INTERVAL_SECS, 2).unwrap(),
        device_id.to_string(),
        "test".to_string(),
        None,
    );
    (client, clock)
}

#[tokio::test]
async fn skewed_clock_resyncs_and_retries() {
    let base = boot().await;
    let (client, clock) = make_client(&base, TEST_SECRET, "device-a");

    // One and a half intervals behind: the first token lands one or two
    // intervals off, always inside the tolerance, never at offset zero.
    clock.set_offset_ms(-(TEST_INTERVAL_SECS as i64) * 1500);

    let resp = client
        .secure_fetch(Method::GET, &format!("{base}/v1/ping"), None)
        .await
        .unwrap();

    // The drift response triggered a resync and a single retry.
    assert_eq!(resp.status(), 200);
    assert!(
        clock.offset_ms().abs() < 5_000,
        "offset should be corrected, was {}",
        clock.offset_ms()
    );
}

#[tokio::test]
async fn background_resync_corrects_a_skewed_offset() {
    let base = boot().await;
    let clock = Arc::new(ClockSync::new(&base).unwrap());
    clock.set_offset_ms(-90_000);

    // The first tick of the resync loop fires immediately.
    let handle = driftgate_cli::clock::spawn_resync(clock.clone());
    for _ in 0..50 {
        if clock.offset_ms().abs() < 5_000 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    handle.abort();

    assert!(
        clock.offset_ms().abs() < 5_000,
        "offset should be corrected, was {}",
        clock.offset_ms()
    );
}

#[tokio::test]
async fn wrong_secret_passes_through_unchanged() {
    let base = boot().await;
    let (client, clock) = make_client(&base, "not-the-secret", "device-b");
    clock.sync().await.unwrap();

    let resp = client
        .secure_fetch(Method::GET, &format!("{base}/v1/ping"), None)
        .await
        .unwrap();

    // Business-level and auth errors are not interpreted by the wrapper.
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], codes::INVALID_APP_SECRET);
}

#[tokio::test]
async fn rate_limited_response_passes_through() {
    let base = boot().await;
    let (client, clock) = make_client(&base, TEST_SECRET, "device-c");
    clock.sync().await.unwrap();

    let url = format!("{base}/v1/ping");
    for _ in 0..3 {
        let resp = client
            .secure_fetch(Method::GET, &url, None)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = client.secure_fetch(Method::GET, &url, None).await.unwrap();
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().contains_key("retry-after"));
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], codes::RATE_LIMIT_EXCEEDED);
}

#[tokio::test]
async fn unreachable_time_endpoint_surfaces_resync_failure() {
    let base = boot().await;

    // Point the clock at a dead address so the drift-triggered resync fails.
    let dead_clock = Arc::new(ClockSync::new("http://127.0.0.1:1").unwrap());
    dead_clock.set_offset_ms(-(TEST_INTERVAL_SECS as i64) * 1500);

    let client = SecureClient::new(
        dead_clock,
        Secret::new(TEST_SECRET).unwrap(),
        TokenScheme::new(TEST_INTERVAL_SECS, 2).unwrap(),
        "device-d".to_string(),
        "test".to_string(),
        None,
    );

    let err = client
        .secure_fetch(Method::GET, &format!("{base}/v1/ping"), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("resync"));
}
