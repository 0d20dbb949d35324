use clap::Parser;
use driftgate_gateway::config::{GatewayArgs, GatewayConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = GatewayArgs::parse();
    let config = match GatewayConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Err(e) = driftgate_gateway::server::run(config).await {
        tracing::error!("gateway error: {e}");
        std::process::exit(1);
    }
}
