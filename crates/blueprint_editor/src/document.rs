// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document metadata and RON persistence.
//!
//! A document file is the graph plus its metadata. Loading never trusts
//! the stored graph: it always passes through
//! [`blueprint_graph::replace_graph_state`].

use blueprint_graph::{replace_graph_state, Graph, RepairReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Document file format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Seconds since the Unix epoch
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Create a new random document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Editor color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    /// Follow the system setting
    #[default]
    System,
    /// Light theme
    Light,
    /// Dark theme
    Dark,
}

/// Preferences for image export of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPreferences {
    /// Pixel scale factor
    pub scale: f64,
    /// Padding around the exported bounds, in world units
    pub padding: f64,
    /// Leave the background transparent
    pub transparent_background: bool,
    /// Export only the selection instead of the whole graph
    pub selection_only: bool,
}

impl Default for ExportPreferences {
    fn default() -> Self {
        Self {
            scale: 2.0,
            padding: 32.0,
            transparent_background: false,
            selection_only: false,
        }
    }
}

/// Per-document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    /// Document ID
    pub id: DocumentId,
    /// Display name
    pub name: String,
    /// Last update (seconds since the Unix epoch)
    pub updated_at: u64,
    /// Export preferences
    #[serde(default)]
    pub export: ExportPreferences,
    /// Theme selection
    #[serde(default)]
    pub theme: Theme,
}

impl DocumentMeta {
    /// Metadata for a fresh document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            updated_at: unix_now(),
            export: ExportPreferences::default(),
            theme: Theme::default(),
        }
    }

    /// Bump the last-updated timestamp
    pub fn touch(&mut self) {
        self.updated_at = unix_now();
    }
}

/// Errors reading or writing documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File I/O error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] ron::error::SpannedError),

    /// File was written by an unknown format version
    #[error("Unsupported document version {0}")]
    UnsupportedVersion(u32),

    /// No open document with this ID
    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentId),
}

/// A persisted document: metadata plus graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// File format version
    pub version: u32,
    /// Metadata
    pub meta: DocumentMeta,
    /// Graph as stored
    pub graph: Graph,
}

impl Document {
    /// Bundle a graph with its metadata
    pub fn new(meta: DocumentMeta, graph: Graph) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            meta,
            graph,
        }
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Parse from RON, repairing the graph
    pub fn from_ron(text: &str) -> Result<(Self, RepairReport), DocumentError> {
        let document: Self = ron::from_str(text)?;
        if document.version != DOCUMENT_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion(document.version));
        }
        let (graph, report) = replace_graph_state(document.graph);
        Ok((
            Self {
                graph,
                ..document
            },
            report,
        ))
    }

    /// Write to a file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved document {:?} to {:?}", self.meta.name, path);
        Ok(())
    }

    /// Read from a file
    pub fn load(path: &Path) -> Result<(Self, RepairReport), DocumentError> {
        let content = std::fs::read_to_string(path)?;
        let loaded = Self::from_ron(&content)?;
        tracing::info!("Loaded document {:?} from {:?}", loaded.0.meta.name, path);
        Ok(loaded)
    }
}
