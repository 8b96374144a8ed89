use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use msgs::HostTarget;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "participant_config.json";
pub const CONFIG_PATH_VAR: &str = "MATRIX_PARTICIPANT_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    /// `ip:port` of the host; discovered over mdns when absent.
    pub host_address: Option<String>,
    pub service_type: String,
    pub auto_guess: bool,
    pub reconnect_delay_ms: u64,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        ParticipantConfig {
            host_address: None,
            service_type: "_matrix-host._tcp.local.".to_owned(),
            auto_guess: false,
            reconnect_delay_ms: 1000,
        }
    }
}

impl ParticipantConfig {
    pub fn load_from(path: &PathBuf) -> anyhow::Result<ParticipantConfig> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config =
            serde_json::from_str::<ParticipantConfig>(&json).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Reads the config file, falling back to defaults. `address_arg`, the
    /// first command line argument, wins over the file.
    pub fn load(address_arg: Option<String>) -> ParticipantConfig {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = match Self::load_from(&path) {
            Ok(config) => {
                info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("using default config: {e:#}");
                ParticipantConfig::default()
            }
        };
        if address_arg.is_some() {
            config.host_address = address_arg;
        }
        config
    }

    pub fn target(&self) -> HostTarget {
        match &self.host_address {
            Some(addr) => HostTarget::Address(addr.clone()),
            None => HostTarget::Discover {
                service_type: self.service_type.clone(),
            },
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_address_skips_discovery() {
        let config: ParticipantConfig = serde_json::from_str(r#"{ "host_address": "10.0.0.2:1302" }"#).unwrap();
        assert!(matches!(config.target(), HostTarget::Address(addr) if addr == "10.0.0.2:1302"));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(1));

        let config = ParticipantConfig::default();
        assert!(matches!(config.target(), HostTarget::Discover { .. }));
    }
}
