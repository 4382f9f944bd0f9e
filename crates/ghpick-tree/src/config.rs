use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TreeResult;

/// Tuning knobs of the [`Explorer`](crate::Explorer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Depth of the bulk listing issued on the first root query.
    pub initial_load_depth: usize,
    /// Depth used by an explicit subtree population.
    pub recursive_load_depth: usize,
    /// Buffer of the change broadcast channel.
    pub channel_capacity: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            initial_load_depth: 3,
            recursive_load_depth: 5,
            channel_capacity: 256,
        }
    }
}

impl ExplorerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> TreeResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> TreeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
