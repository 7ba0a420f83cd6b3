//! Server configuration.
//!
//! Loaded from an optional JSON file. Every field has a default so a partial
//! file (or none at all) is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use starforge_logic::network::NetworkParams;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP/WebSocket endpoint.
    pub bind: String,
    pub tick_interval_secs: u64,
    /// Used when `RUST_LOG` is not set.
    pub log_level: String,
    pub hub: HubConfig,
    pub galaxy: GalaxyConfig,
    pub network: NetworkParams,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8090".to_string(),
            tick_interval_secs: 60,
            log_level: "info".to_string(),
            hub: HubConfig::default(),
            galaxy: GalaxyConfig::default(),
            network: NetworkParams::default(),
        }
    }
}

/// Queue depths for the broadcast hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Outbound frames a client may fall behind before it is dropped.
    pub connection_queue: usize,
    pub command_queue: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            connection_queue: 64,
            command_queue: 1024,
        }
    }
}

/// Parameters for seeding an empty galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub system_count: usize,
    pub width: f64,
    pub height: f64,
    pub planets_per_system: usize,
    pub seed: u64,
    /// Starting players, each given a colony and a bank.
    pub players: Vec<PlayerSeed>,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            system_count: 60,
            width: 4000.0,
            height: 3000.0,
            planets_per_system: 3,
            seed: 1,
            players: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeed {
    pub name: String,
    pub token: String,
}

impl ServerConfig {
    /// Read the config at `path`. No path, or a path that does not exist,
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            log::warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
