use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "host_config.json";
pub const CONFIG_PATH_VAR: &str = "MATRIX_HOST_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub port: u16,
    pub advertise_mdns: bool,
    pub service_type: String,
    pub instance_name: String,
    pub broadcast_capacity: usize,
    pub queue_capacity: usize,
    /// Auto-guess preference pushed to participants at startup.
    pub auto_guess_all: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            port: 1302,
            advertise_mdns: true,
            service_type: "_matrix-host._tcp.local.".to_owned(),
            instance_name: "matrix_host".to_owned(),
            broadcast_capacity: 100,
            queue_capacity: 100,
            auto_guess_all: false,
        }
    }
}

impl HostConfig {
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(path: &PathBuf) -> anyhow::Result<HostConfig> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str::<HostConfig>(&json).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Reads the config file, falling back to defaults.
    pub fn load() -> HostConfig {
        let path = Self::path();
        match Self::load_from(&path) {
            Ok(config) => {
                info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("using default config: {e:#}");
                HostConfig::default()
            }
        }
    }
}
