//! `driftgate config` — read and write ~/.driftgate/config.toml.

use anyhow::{bail, Result};

use driftgate_cli::storage;

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut config = storage::load_config()?;
    match key {
        "gateway" => config.gateway = value.to_string(),
        _ => bail!("unknown config key: {key} (known keys: gateway)"),
    }
    storage::save_config(&config)?;
    println!("{key} = {value}");
    Ok(())
}

pub fn get(key: &str) -> Result<()> {
    let config = storage::load_config()?;
    match key {
        "gateway" => println!("{}", config.gateway),
        _ => bail!("unknown config key: {key} (known keys: gateway)"),
    }
    Ok(())
}
