//! Per-installation device identity.
//!
//! An opaque random id, generated once and persisted locally. It labels an
//! installation for rate limiting; it is not a credential.

use std::path::Path;

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceFile {
    device_id: String,
}

/// Load the persisted device id, creating and saving one on first use.
pub fn load_or_create(path: &Path) -> Result<String> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: DeviceFile = toml::from_str(&contents)
            .with_context(|| format!("invalid device file {}", path.display()))?;
        if !file.device_id.is_empty() {
            return Ok(file.device_id);
        }
    }

    let device_id = generate();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let contents = toml::to_string_pretty(&DeviceFile {
        device_id: device_id.clone(),
    })?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(device_id)
}

/// Generate a fresh device id: 16 random bytes, hex-encoded.
pub fn generate() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
