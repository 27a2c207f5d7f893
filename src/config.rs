//! Engine configuration
//!
//! ```yaml
//! max_batch_size: 1000
//! max_nodes: 1000000
//! max_edges: null
//! data_extension: json
//! ```

use crate::graph::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Limits and conventions of a `GraphEngine`. Missing YAML fields take their
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum statements per batch
    pub max_batch_size: Option<usize>,
    /// Maximum number of nodes
    pub max_nodes: Option<usize>,
    /// Maximum number of edges
    pub max_edges: Option<usize>,
    /// Extension used when naming data blobs
    pub data_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: None,
            max_nodes: None,
            max_edges: None,
            data_extension: "json".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_batch_size == Some(0) {
            return Err(ConfigError::Invalid("max_batch_size must be positive".to_string()));
        }
        if self.data_extension.is_empty() || self.data_extension.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "data_extension {:?} is not a file extension",
                self.data_extension
            )));
        }
        Ok(())
    }

    /// Fail when adding one more node would exceed `max_nodes`
    pub fn check_node_quota(&self, node_count: usize) -> GraphResult<()> {
        check_quota("nodes", node_count, 1, self.max_nodes)
    }

    /// Fail when adding `additional` edges would exceed `max_edges`
    pub fn check_edge_quota(&self, edge_count: usize, additional: usize) -> GraphResult<()> {
        check_quota("edges", edge_count, additional, self.max_edges)
    }
}

fn check_quota(
    resource: &str,
    current: usize,
    additional: usize,
    max: Option<usize>,
) -> GraphResult<()> {
    match max {
        Some(max) if additional > 0 && current + additional > max => Err(
            GraphError::QuotaExceeded(format!("{} ({}/{})", resource, current, max)),
        ),
        _ => Ok(()),
    }
}
