//! ~/.driftgate/ config management.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Get the driftgate config directory (~/.driftgate/).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".driftgate"))
}

/// Ensure ~/.driftgate/ exists.
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_gateway")]
    pub gateway: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gateway: default_gateway(),
        }
    }
}

fn default_gateway() -> String {
    "http://127.0.0.1:8080".into()
}

pub fn load_config() -> Result<Config> {
    let path = config_dir()?.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    let mut config: Config = toml::from_str(&contents)?;
    if config.gateway.is_empty() {
        config.gateway = default_gateway();
    } else if !config.gateway.starts_with("http://") && !config.gateway.starts_with("https://") {
        anyhow::bail!(
            "invalid gateway URL {:?} in ~/.driftgate/config.toml — must start with http:// or https://\n\
             Reset it with: driftgate config set gateway {}",
            config.gateway,
            default_gateway()
        );
    }
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    let dir = ensure_config_dir()?;
    let path = dir.join("config.toml");
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    Ok(())
}

/// Resolve the gateway base URL: an explicit override wins over the config
/// file.
pub fn resolve_gateway(flag: Option<String>) -> Result<String> {
    if let Some(gateway) = flag {
        return Ok(gateway);
    }
    Ok(load_config()?.gateway)
}
