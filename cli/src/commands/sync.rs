//! `driftgate sync` — measure the gateway clock offset.

use anyhow::Result;

use driftgate_cli::clock::ClockSync;
use driftgate_cli::storage;

pub async fn run(gateway: Option<String>) -> Result<()> {
    let base = storage::resolve_gateway(gateway)?;
    let clock = ClockSync::new(&base)?;
    clock.sync().await?;
    println!("offset: {} ms ({})", clock.offset_ms(), base);
    Ok(())
}
