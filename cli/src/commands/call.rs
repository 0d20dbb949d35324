//! `driftgate call` — issue an authenticated request against the gateway.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Method;

use driftgate_cli::clock::ClockSync;
use driftgate_cli::fetch::SecureClient;
use driftgate_cli::{device, storage};
use driftgate_proto::{Secret, TokenScheme};

pub async fn run(
    path: &str,
    method: &str,
    data: Option<String>,
    secret: String,
    interval_secs: u64,
    locale: Option<String>,
    gateway: Option<String>,
) -> Result<()> {
    let base = storage::resolve_gateway(gateway)?;
    let secret = Secret::new(secret)?;
    let scheme = TokenScheme::new(interval_secs, TokenScheme::DEFAULT_TOLERANCE)?;

    let method: Method = method.parse().context("invalid HTTP method")?;
    let body = match data {
        Some(data) => {
            Some(serde_json::from_str(&data).context("request body is not valid JSON")?)
        }
        None => None,
    };

    let clock = Arc::new(ClockSync::new(&base)?);
    clock.sync().await.context("initial clock sync failed")?;

    let device_id = device::load_or_create(&storage::config_dir()?.join("device.toml"))?;

    let client = SecureClient::new(
        clock,
        secret,
        scheme,
        device_id,
        std::env::consts::OS.to_string(),
        locale,
    );

    let url = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };

    let resp = client.secure_fetch(method, &url, body).await?;
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    println!("{status}");
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}
