//! Agent configuration: external tool programs, mbuffer defaults, and the
//! controller notification endpoint.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Program invoked for snapshot lifecycle and send/receive.
    pub zfs_program: String,
    /// Program invoked for network buffering on both ends of a transfer.
    pub mbuffer_program: String,
    /// Default mbuffer memory size, overridable per request.
    pub mbuffer_size: String,
    /// Default mbuffer rate limit, overridable per request.
    pub mbuffer_rate: String,
    /// Controller endpoint for deferred transfer notifications. When unset,
    /// completed transfers are only logged.
    pub controller_api_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            zfs_program: "zfs".to_string(),
            mbuffer_program: "mbuffer".to_string(),
            mbuffer_size: "1G".to_string(),
            mbuffer_rate: "1G".to_string(),
            controller_api_url: None,
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// no path is given, then apply `ZFS_AGENT_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Self = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.merge_env_vars();
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        if let Ok(program) = std::env::var("ZFS_AGENT_ZFS_PROGRAM") {
            self.zfs_program = program;
        }
        if let Ok(program) = std::env::var("ZFS_AGENT_MBUFFER_PROGRAM") {
            self.mbuffer_program = program;
        }
        if let Ok(size) = std::env::var("ZFS_AGENT_MBUFFER_SIZE") {
            self.mbuffer_size = size;
        }
        if let Ok(rate) = std::env::var("ZFS_AGENT_MBUFFER_RATE") {
            self.mbuffer_rate = rate;
        }
        if let Ok(url) = std::env::var("ZFS_AGENT_CONTROLLER_API_URL") {
            self.controller_api_url = Some(url);
        }
    }
}
