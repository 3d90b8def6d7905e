//! Snapshot configuration.
//!
//! Loaded from TOML; every field has a default so a partial file is fine.
//!
//! ```toml
//! platform_version = 34
//! max_depth = 100
//! max_children = 1000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::CapabilitySet;

/// Maximum recursion depth for tree traversal.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Maximum number of child indices visited per node.
pub const DEFAULT_MAX_CHILDREN: usize = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Host platform version used to resolve capabilities. When unset, every
    /// capability is treated as available.
    #[serde(default)]
    pub platform_version: Option<u32>,

    /// Nodes at this depth are recorded but their children are not visited.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Child indices past this count are not visited.
    #[serde(default = "default_max_children")]
    pub max_children: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            platform_version: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_children() -> usize {
    DEFAULT_MAX_CHILDREN
}

impl SnapshotConfig {
    /// Parse a TOML document.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a config file. Errors are returned, not defaulted.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load a config file, falling back to defaults when it is missing or invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(config) => {
                log::info!("Loaded snapshot configuration from {:?}", path);
                config
            }
            Err(ConfigError::Io(_)) => {
                log::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to parse config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn with_platform_version(mut self, version: u32) -> Self {
        self.platform_version = Some(version);
        self
    }

    /// Capability set for the configured platform version.
    pub fn capabilities(&self) -> CapabilitySet {
        match self.platform_version {
            Some(version) => CapabilitySet::resolve(version),
            None => CapabilitySet::all(),
        }
    }
}
