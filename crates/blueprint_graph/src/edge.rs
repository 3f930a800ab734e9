// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::pin::PinId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color given to newly created edges
pub const DEFAULT_EDGE_COLOR: &str = "#c8ccd4";

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed edge from an output pin to an input pin.
///
/// Endpoints never change after creation; reconnecting is a delete plus
/// a create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Source (output) pin
    pub from: PinId,
    /// Destination (input) pin
    pub to: PinId,
    /// Stroke color
    pub color: String,
}

impl Edge {
    /// Create a new edge with the default color
    pub fn new(id: EdgeId, from: PinId, to: PinId) -> Self {
        Self {
            id,
            from,
            to,
            color: DEFAULT_EDGE_COLOR.to_string(),
        }
    }

    /// Check if this edge touches a specific pin
    pub fn involves_pin(&self, pin_id: &PinId) -> bool {
        self.from == *pin_id || self.to == *pin_id
    }

    /// Check if this edge joins exactly `from` to `to`
    pub fn joins(&self, from: &PinId, to: &PinId) -> bool {
        self.from == *from && self.to == *to
    }
}
