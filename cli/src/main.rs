mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driftgate", about = "Client for the driftgate request gateway")]
struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "DRIFTGATE_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the gateway clock offset
    Sync {
        /// Gateway URL override (e.g. http://127.0.0.1:8080)
        #[arg(long, env = "DRIFTGATE_GATEWAY")]
        gateway: Option<String>,
    },

    /// Issue an authenticated request against the gateway
    Call {
        /// Path or absolute URL to call (e.g. /v1/ping)
        path: String,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(long)]
        data: Option<String>,

        /// Shared secret for token derivation
        #[arg(long, env = "DRIFTGATE_SECRET", hide_env_values = true)]
        secret: String,

        /// Token interval length in seconds (must match the gateway)
        #[arg(long, default_value = "10")]
        interval_secs: u64,

        /// Locale hint forwarded to business handlers
        #[arg(long)]
        locale: Option<String>,

        /// Gateway URL override (e.g. http://127.0.0.1:8080)
        #[arg(long, env = "DRIFTGATE_GATEWAY")]
        gateway: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a config value
    Set { key: String, value: String },
    /// Get a config value
    Get { key: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Sync { gateway } => commands::sync::run(gateway).await,
        Commands::Call {
            path,
            method,
            data,
            secret,
            interval_secs,
            locale,
            gateway,
        } => commands::call::run(&path, &method, data, secret, interval_secs, locale, gateway).await,
        Commands::Config { action } => match action {
            ConfigAction::Set { key, value } => commands::config::set(&key, &value),
            ConfigAction::Get { key } => commands::config::get(&key),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
