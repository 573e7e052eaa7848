//! Application configuration
//!
//! Layered in this order, later layers winning:
//! 1. built-in defaults
//! 2. an optional JSON file (`--config`)
//! 3. environment (`COLORWALK_DATA_DIR`, `COLORWALK_LISTEN`)
//! 4. command-line flags

use anyhow::{anyhow, Result};
use colorwalk_recommend::EngineConfig;
use colorwalk_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "COLORWALK_DATA_DIR";
pub const LISTEN_ENV: &str = "COLORWALK_LISTEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub listen: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            engine: EngineConfig::default(),
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl AppConfig {
    /// Defaults, then the file (if any), then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config {}: {e}", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(listen) = lookup(LISTEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.listen = listen
                .trim()
                .parse()
                .map_err(|e| anyhow!("{LISTEN_ENV}=`{listen}` is not a socket address: {e}"))?;
        }
        Ok(())
    }
}
