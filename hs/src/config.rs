//! HeatSync configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::AgentConfig;
use crate::coordinator::{CollectMode, CoordinatorConfig};
use crate::error::SyncError;

/// Main HeatSync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Where the central listens and externals dial
    pub network: NetworkConfig,

    /// Parameters both sides of a run must agree on
    pub protocol: ProtocolConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./heatsync.yml
        let local_config = PathBuf::from("heatsync.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/heatsync/heatsync.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("heatsync").join("heatsync.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, so logging can start before the full load
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate configuration before use
    pub fn validate(&self) -> Result<(), SyncError> {
        self.coordinator_config().validate()?;
        if self.network.host.trim().is_empty() {
            return Err(SyncError::InvalidConfig("network host is empty".to_string()));
        }
        Ok(())
    }

    /// Coordinator settings derived from the protocol section
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            externals: self.protocol.externals,
            epsilon: self.protocol.epsilon,
            receive_timeout: self.protocol.receive_timeout(),
            collect: self.protocol.collect,
        }
    }

    /// Agent settings for external `index`
    pub fn agent_config(&self, index: u32, initial_temperature: f32) -> AgentConfig {
        AgentConfig::new(index, initial_temperature, self.protocol.externals)
            .with_receive_timeout(self.protocol.receive_timeout())
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the central binds and externals dial
    pub host: String,

    /// TCP port
    pub port: u16,

    /// How long an external waits for its connection to be accepted
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// How long the central waits for every external to connect; none waits forever
    #[serde(rename = "accept-timeout-ms")]
    pub accept_timeout_ms: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            connect_timeout_ms: 5_000,
            accept_timeout_ms: None,
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn accept_timeout(&self) -> Option<Duration> {
        self.accept_timeout_ms.map(Duration::from_millis)
    }
}

/// Protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Number of externals (N)
    pub externals: usize,

    /// Convergence tolerance
    pub epsilon: f32,

    /// Per-receive limit on both sides; none blocks like the reference peers
    #[serde(rename = "receive-timeout-ms")]
    pub receive_timeout_ms: Option<u64>,

    /// Collect strategy for the central
    pub collect: CollectMode,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            externals: crate::DEFAULT_EXTERNALS,
            epsilon: crate::DEFAULT_EPSILON,
            receive_timeout_ms: None,
            collect: CollectMode::Sequential,
        }
    }
}

impl ProtocolConfig {
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_ms.map(Duration::from_millis)
    }
}
