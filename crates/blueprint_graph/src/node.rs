// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph.

use crate::geometry::{Bounds, Point, Size};
use crate::pin::{PinDirection, PinId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default node width in world units
pub const NODE_WIDTH: f64 = 180.0;
/// Height of the title row
pub const NODE_HEADER_HEIGHT: f64 = 24.0;
/// Height of one pin row
pub const PIN_ROW_HEIGHT: f64 = 22.0;
/// Title given to nodes created without one
pub const DEFAULT_NODE_TITLE: &str = "Node";

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display flags a node may carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFlags {
    /// Render in condensed form (title only, pins inline)
    pub condensed: bool,
    /// Custom tint color
    pub tint: Option<String>,
    /// Whether the title row itself carries a pin, and which way
    pub title_pin: Option<PinDirection>,
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Display title
    pub title: String,
    /// Top-left corner in world space
    pub position: Point,
    /// Rectangle size in world units
    pub size: Size,
    /// Input pins, top to bottom
    pub inputs: Vec<PinId>,
    /// Output pins, top to bottom
    pub outputs: Vec<PinId>,
    /// Display flags
    #[serde(default)]
    pub flags: NodeFlags,
}

impl Node {
    /// Create an empty node at `position`
    pub fn new(id: NodeId, title: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            title: title.into(),
            position,
            size: default_size(0),
            inputs: Vec::new(),
            outputs: Vec::new(),
            flags: NodeFlags::default(),
        }
    }

    /// Pin list for one direction
    pub fn pins(&self, direction: PinDirection) -> &[PinId] {
        match direction {
            PinDirection::Input => &self.inputs,
            PinDirection::Output => &self.outputs,
        }
    }

    pub(crate) fn pins_mut(&mut self, direction: PinDirection) -> &mut Vec<PinId> {
        match direction {
            PinDirection::Input => &mut self.inputs,
            PinDirection::Output => &mut self.outputs,
        }
    }

    /// All pin IDs, inputs first
    pub fn all_pins(&self) -> impl Iterator<Item = &PinId> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Whether this node lists `pin_id` in either direction
    pub fn has_pin(&self, pin_id: &PinId) -> bool {
        self.all_pins().any(|p| p == pin_id)
    }

    /// Bounding rectangle in world space
    pub fn bounds(&self) -> Bounds {
        Bounds::of_rect(self.position, self.size)
    }

    /// Number of pin rows the node renders with
    pub fn row_count(&self) -> usize {
        self.inputs.len().max(self.outputs.len())
    }
}

/// Default size for a node with `rows` pin rows
pub fn default_size(rows: usize) -> Size {
    #[allow(clippy::cast_precision_loss)]
    let rows = rows as f64;
    Size::new(NODE_WIDTH, NODE_HEADER_HEIGHT + rows * PIN_ROW_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_size_grows_with_rows() {
        assert_eq!(default_size(0).height, NODE_HEADER_HEIGHT);
        assert_eq!(default_size(3).height, NODE_HEADER_HEIGHT + 3.0 * PIN_ROW_HEIGHT);
        assert_eq!(default_size(3).width, NODE_WIDTH);
    }

    #[test]
    fn test_pin_lists() {
        let mut node = Node::new(NodeId::new("n"), "Add", Point::new(10.0, 20.0));
        node.pins_mut(PinDirection::Input).push(PinId::new("a"));
        node.pins_mut(PinDirection::Input).push(PinId::new("b"));
        node.pins_mut(PinDirection::Output).push(PinId::new("sum"));
        assert_eq!(node.pins(PinDirection::Input).len(), 2);
        assert_eq!(node.row_count(), 2);
        assert!(node.has_pin(&PinId::new("sum")));
        assert!(!node.has_pin(&PinId::new("c")));
    }

    #[test]
    fn test_bounds() {
        let mut node = Node::new(NodeId::new("n"), "Add", Point::new(10.0, 20.0));
        node.size = Size::new(100.0, 40.0);
        let bounds = node.bounds();
        assert_eq!(bounds.max_x, 110.0);
        assert_eq!(bounds.max_y, 60.0);
    }
}
