//! Secure request wrapper — token attachment and the single drift retry.
//!
//! Drop-in layer over a plain HTTP request: derive a token from adjusted
//! time, attach it with the device headers, send. A drift response triggers
//! one resync and one full retry with a fresh token; a second drift signal
//! is surfaced as an error to bound worst-case latency under a persistently
//! broken clock. Every other status, 2xx or not, passes through untouched.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reqwest::{Method, Response, StatusCode};

use driftgate_proto::token::derive_token;
use driftgate_proto::wire::{codes, headers, ErrorBody};
use driftgate_proto::{Secret, TokenScheme};

use crate::clock::ClockSync;

pub struct SecureClient {
    http: reqwest::Client,
    clock: Arc<ClockSync>,
    secret: Secret,
    scheme: TokenScheme,
    device_id: String,
    platform: String,
    locale: Option<String>,
}

impl SecureClient {
    pub fn new(
        clock: Arc<ClockSync>,
        secret: Secret,
        scheme: TokenScheme,
        device_id: String,
        platform: String,
        locale: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            clock,
            secret,
            scheme,
            device_id,
            platform,
            locale,
        }
    }

    /// Issue an authenticated request, resyncing and retrying exactly once
    /// if the gateway reports clock drift.
    pub async fn secure_fetch(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let first = self.send_once(method.clone(), url, body.as_ref()).await?;
        if first.status() != StatusCode::CONFLICT {
            return Ok(first);
        }

        let code = read_error_code(first).await;
        if code.as_deref() != Some(codes::CLOCK_DRIFT) {
            bail!(
                "gateway returned 409 with code {}",
                code.unwrap_or_else(|| "unknown".into())
            );
        }

        tracing::debug!("clock drift reported, resyncing and retrying once");
        self.clock
            .sync()
            .await
            .context("resync after drift signal failed")?;

        let second = self.send_once(method, url, body.as_ref()).await?;
        if second.status() == StatusCode::CONFLICT {
            let code = read_error_code(second).await;
            bail!(
                "clock drift persisted after resync (code {})",
                code.unwrap_or_else(|| "unknown".into())
            );
        }
        Ok(second)
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let interval = self.scheme.interval_for(self.clock.adjusted_now_secs());
        let token = derive_token(&self.secret, interval);

        let mut req = self
            .http
            .request(method, url)
            .header(headers::APP_SECRET, token)
            .header(headers::DEVICE_ID, &self.device_id)
            .header(headers::PLATFORM, &self.platform);
        if let Some(locale) = &self.locale {
            req = req.header(headers::LOCALE, locale);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        req.send().await.context("request failed")
    }
}

async fn read_error_code(resp: Response) -> Option<String> {
    let text = resp.text().await.ok()?;
    ErrorBody::from_json(&text).ok().map(|body| body.code)
}
