// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.

use crate::history::MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a RON config file
pub const CONFIG_ENV: &str = "BLUEPRINT_CONFIG";

/// Errors reading a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid RON for [`StoreConfig`]
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Store-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Undo steps kept per document
    pub history_depth: usize,
    /// Single-input policy for new documents
    pub single_input_policy: bool,
    /// Same-node connection policy for new documents
    pub allow_same_node_connections: bool,
    /// Name given to new documents
    pub default_document_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_depth: MAX_HISTORY,
            single_input_policy: true,
            allow_same_node_connections: false,
            default_document_name: "Untitled".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parse from RON; missing fields take their defaults
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Read from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_ron(&std::fs::read_to_string(path)?)
    }

    /// Load from the file named by [`CONFIG_ENV`], or fall back to defaults
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
