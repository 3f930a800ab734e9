// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clipboard envelope around graph subsets.
//!
//! The envelope is JSON with an explicit kind string and integer version.
//! Decoding checks both before looking at the payload and never tries to
//! upgrade an unknown version.

use crate::document::{unix_now, DocumentId};
use blueprint_graph::GraphSubset;
use serde::{Deserialize, Serialize};

/// Kind tag of a subset envelope
pub const CLIPBOARD_KIND: &str = "blueprint/subset";
/// Envelope version this build reads and writes
pub const CLIPBOARD_VERSION: u32 = 1;

/// Clipboard decoding errors
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// Text is not a well-formed envelope
    #[error("Malformed clipboard payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope has a kind other than [`CLIPBOARD_KIND`]
    #[error("Unknown clipboard kind: {0}")]
    UnknownKind(String),

    /// Envelope has a version other than [`CLIPBOARD_VERSION`]
    #[error("Unsupported clipboard version: {0}")]
    UnsupportedVersion(u64),
}

/// A subset wrapped for the clipboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardEnvelope {
    /// Always [`CLIPBOARD_KIND`]
    pub kind: String,
    /// Always [`CLIPBOARD_VERSION`]
    pub version: u32,
    /// Creation time (seconds since the Unix epoch)
    pub timestamp: u64,
    /// Document the subset was copied from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<DocumentId>,
    /// The copied nodes, pins and edges
    pub subset: GraphSubset,
}

/// Header fields checked before the payload is parsed
#[derive(Deserialize)]
struct Header {
    kind: String,
    version: u64,
}

impl ClipboardEnvelope {
    /// Wrap a subset
    pub fn new(subset: GraphSubset, source_document: Option<DocumentId>) -> Self {
        Self {
            kind: CLIPBOARD_KIND.to_string(),
            version: CLIPBOARD_VERSION,
            timestamp: unix_now(),
            source_document,
            subset,
        }
    }

    /// Serialize to JSON text
    pub fn encode(&self) -> Result<String, ClipboardError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse JSON text, rejecting unknown kinds and versions
    pub fn decode(text: &str) -> Result<Self, ClipboardError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let header: Header = serde_json::from_value(value.clone())?;
        if header.kind != CLIPBOARD_KIND {
            return Err(ClipboardError::UnknownKind(header.kind));
        }
        if header.version != u64::from(CLIPBOARD_VERSION) {
            return Err(ClipboardError::UnsupportedVersion(header.version));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_graph::ops::{create_node, NewNode};
    use blueprint_graph::{build_subset_for_selection, Graph, IdAllocator, PinTemplate, Point};

    fn envelope() -> ClipboardEnvelope {
        let (graph, _) = create_node(
            &Graph::new(),
            &mut IdAllocator::new(),
            &NewNode::at(Point::new(1.0, 2.0)).with_pin(PinTemplate::output("Out")),
        );
        let subset = build_subset_for_selection(&graph).unwrap();
        ClipboardEnvelope::new(subset, Some(DocumentId::new()))
    }

    #[test]
    fn test_encode_decode() {
        let original = envelope();
        let decoded = ClipboardEnvelope::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let mut value = serde_json::to_value(envelope()).unwrap();
        value["kind"] = "something/else".into();
        assert!(matches!(
            ClipboardEnvelope::decode(&value.to_string()),
            Err(ClipboardError::UnknownKind(kind)) if kind == "something/else"
        ));
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut value = serde_json::to_value(envelope()).unwrap();
        value["version"] = 2.into();
        assert!(matches!(
            ClipboardEnvelope::decode(&value.to_string()),
            Err(ClipboardError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert!(matches!(
            ClipboardEnvelope::decode("plain text from somewhere"),
            Err(ClipboardError::Malformed(_))
        ));

        let mut value = serde_json::to_value(envelope()).unwrap();
        value["subset"]["nodes"] = "oops".into();
        assert!(matches!(
            ClipboardEnvelope::decode(&value.to_string()),
            Err(ClipboardError::Malformed(_))
        ));

        let missing_kind = r#"{"version":1,"timestamp":0,"subset":{}}"#;
        assert!(matches!(
            ClipboardEnvelope::decode(missing_kind),
            Err(ClipboardError::Malformed(_))
        ));
    }
}
