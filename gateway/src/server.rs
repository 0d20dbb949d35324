//! HTTP edge — router assembly and serve loop.

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Json, Router};

use driftgate_proto::wire::ServerTime;

use crate::config::GatewayConfig;
use crate::gate;
use crate::state::{GatewayState, SharedState};

/// Build the gateway router: the unauthenticated time endpoint plus the
/// guarded routes. Layer order puts the token check outermost, then the
/// rate limit, then the handler.
pub fn router(state: SharedState) -> Router {
    let ping_quota = state.config.ping_quota;

    let protected = Router::new()
        .route("/v1/ping", get(ping))
        .route_layer(middleware::from_fn({
            let state = state.clone();
            move |req: axum::extract::Request, next: middleware::Next| {
                let state = state.clone();
                async move { gate::enforce_quota(state, "ping", ping_quota, req, next).await }
            }
        }))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_token,
        ));

    Router::new()
        // Bootstrap dependency: clients query this before they can hold a
        // valid token, so it stays exempt from the authenticator.
        .route("/v1/time", get(server_time))
        .merge(protected)
}

async fn server_time() -> Json<ServerTime> {
    Json(ServerTime {
        server_time: gate::unix_now_ms() as i64,
    })
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Start the gateway.
pub async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state: SharedState = Arc::new(GatewayState::new(config.clone()));

    // Spawn background pruning of idle rate-limit records
    {
        let state = state.clone();
        tokio::spawn(crate::cleanup::run_sweep_loop(state));
    }

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("driftgate-gateway listening on {}", config.bind);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Start the gateway on a random port for testing. Returns the bound
/// address; the server runs in a background task until the handle drops.
pub async fn run_test(
    config: GatewayConfig,
) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>), Box<dyn std::error::Error>> {
    let state: SharedState = Arc::new(GatewayState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });

    Ok((addr, handle))
}
