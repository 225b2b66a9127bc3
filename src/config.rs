//! Configuration system for the simulation scenarios.
//!
//! Both scenarios can be configured programmatically or loaded from a
//! YAML/JSON file, which is convenient for parametric sweeps.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! queue:
//!   arrival_rate: 0.9
//!   buffer_capacity: 10
//!   packet_count: 50000
//!   seed: 5
//!
//! mac:
//!   arrival_rate: 0.05
//!   algorithm: exponential
//!   node_count: 10
//!   packets_per_node: 5000
//!   seed: 5        # null picks a random seed at run start
//! ```

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::backoff::BackoffAlgorithm;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Seed used when none is given, so runs are reproducible by default.
pub const DEFAULT_SEED: u64 = 5;

fn default_service_rate() -> f64 {
    1.0
}

fn default_packet_count() -> u64 {
    50_000
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_mac_seed() -> Option<u64> {
    Some(DEFAULT_SEED)
}

fn default_node_count() -> usize {
    10
}

fn default_packets_per_node() -> u64 {
    5000
}

fn validate_rate(name: &str, rate: f64) -> ConfigResult<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be a positive number, got {rate}"
        )))
    }
}

/// Parameters of the finite-buffer queue scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Packet arrival rate (λ)
    pub arrival_rate: f64,

    /// Service rate (μ)
    #[serde(default = "default_service_rate")]
    pub service_rate: f64,

    /// Buffer capacity (B), counting the packet in service
    pub buffer_capacity: u32,

    /// Number of packets to generate
    #[serde(default = "default_packet_count")]
    pub packet_count: u64,

    /// Random seed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl QueueConfig {
    /// Creates a configuration with μ = 1, 50000 packets and the default seed.
    pub fn new(arrival_rate: f64, buffer_capacity: u32) -> Self {
        Self {
            arrival_rate,
            service_rate: default_service_rate(),
            buffer_capacity,
            packet_count: default_packet_count(),
            seed: DEFAULT_SEED,
        }
    }

    /// Sets the number of packets.
    pub fn with_packet_count(mut self, packet_count: u64) -> Self {
        self.packet_count = packet_count;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the service rate.
    pub fn with_service_rate(mut self, service_rate: f64) -> Self {
        self.service_rate = service_rate;
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_rate("arrival_rate", self.arrival_rate)?;
        validate_rate("service_rate", self.service_rate)?;
        if self.packet_count == 0 {
            return Err(ConfigError::Validation(
                "packet_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the slotted multiple-access scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MacConfig {
    /// Per-node packet arrival rate (λ)
    pub arrival_rate: f64,

    /// Backoff policy applied after collisions
    pub algorithm: BackoffAlgorithm,

    /// Number of nodes sharing the medium
    #[serde(default = "default_node_count")]
    pub node_count: usize,

    /// Packets each node must deliver
    #[serde(default = "default_packets_per_node")]
    pub packets_per_node: u64,

    /// Random seed; `None` draws one at run start
    #[serde(default = "default_mac_seed")]
    pub seed: Option<u64>,
}

impl MacConfig {
    /// Creates a configuration with 10 nodes, 5000 packets each and the default seed.
    pub fn new(arrival_rate: f64, algorithm: BackoffAlgorithm) -> Self {
        Self {
            arrival_rate,
            algorithm,
            node_count: default_node_count(),
            packets_per_node: default_packets_per_node(),
            seed: default_mac_seed(),
        }
    }

    /// Sets the number of nodes.
    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count;
        self
    }

    /// Sets the number of packets per node.
    pub fn with_packets_per_node(mut self, packets_per_node: u64) -> Self {
        self.packets_per_node = packets_per_node;
        self
    }

    /// Sets the seed. `None` requests a random one.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Total successful transmissions that end the run.
    pub fn total_packets(&self) -> u64 {
        self.node_count as u64 * self.packets_per_node
    }

    /// Returns the configured seed, or draws one from `1..10000`.
    pub fn resolve_seed(&self) -> u64 {
        self.seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..10_000))
    }

    /// Validates the parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_rate("arrival_rate", self.arrival_rate)?;
        if self.node_count == 0 {
            return Err(ConfigError::Validation(
                "node_count must be at least 1".to_string(),
            ));
        }
        if self.packets_per_node == 0 {
            return Err(ConfigError::Validation(
                "packets_per_node must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Queue scenario parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueConfig>,

    /// Multiple-access scenario parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacConfig>,
}

impl SimConfig {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates every section present.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(queue) = &self.queue {
            queue.validate()?;
        }
        if let Some(mac) = &self.mac {
            mac.validate()?;
        }
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue scenario.
    pub fn queue(mut self, queue: QueueConfig) -> Self {
        self.config.queue = Some(queue);
        self
    }

    /// Sets the multiple-access scenario.
    pub fn mac(mut self, mac: MacConfig) -> Self {
        self.config.mac = Some(mac);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
