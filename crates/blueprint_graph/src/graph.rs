// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph aggregate containing nodes, pins, edges, selection and viewport.
//!
//! A [`Graph`] is treated as an immutable value: every mutation in
//! [`crate::ops`] clones it, edits the clone and returns the result. The
//! structural helpers in this module are crate-private so that no caller
//! can leave the aggregate half-edited.

use crate::edge::{Edge, EdgeId};
use crate::geometry::Viewport;
use crate::node::{Node, NodeId};
use crate::pin::{Pin, PinDirection, PinId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// A blueprint graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) pins: IndexMap<PinId, Pin>,
    pub(crate) edges: IndexMap<EdgeId, Edge>,
    /// Paint order of nodes
    pub(crate) order: Vec<NodeId>,
    /// Paint order of edges
    pub(crate) edge_order: Vec<EdgeId>,
    #[serde(default)]
    pub(crate) selected_nodes: IndexSet<NodeId>,
    #[serde(default)]
    pub(crate) selected_edges: IndexSet<EdgeId>,
    #[serde(default)]
    pub(crate) viewport: Viewport,
    pub(crate) single_input_policy: bool,
    pub(crate) allow_same_node_connections: bool,
}

impl Graph {
    /// Create a new empty graph with the default policies
    pub fn new() -> Self {
        Self::with_policies(true, false)
    }

    /// Create a new empty graph with explicit connection policies
    pub fn with_policies(single_input_policy: bool, allow_same_node_connections: bool) -> Self {
        Self {
            nodes: IndexMap::new(),
            pins: IndexMap::new(),
            edges: IndexMap::new(),
            order: Vec::new(),
            edge_order: Vec::new(),
            selected_nodes: IndexSet::new(),
            selected_edges: IndexSet::new(),
            viewport: Viewport::default(),
            single_input_policy,
            allow_same_node_connections,
        }
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get a pin by ID
    pub fn pin(&self, pin_id: &PinId) -> Option<&Pin> {
        self.pins.get(pin_id)
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    /// Whether a node with this ID exists
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Whether a pin with this ID exists
    pub fn contains_pin(&self, pin_id: &PinId) -> bool {
        self.pins.contains_key(pin_id)
    }

    /// Whether an edge with this ID exists
    pub fn contains_edge(&self, edge_id: &EdgeId) -> bool {
        self.edges.contains_key(edge_id)
    }

    /// Nodes in paint order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// All pins, in insertion order
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    /// Edges in paint order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    /// Node paint order
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Edge paint order
    pub fn edge_order(&self) -> &[EdgeId] {
        &self.edge_order
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of pins
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pins of a node in one direction, top to bottom
    pub fn node_pins(
        &self,
        node_id: &NodeId,
        direction: PinDirection,
    ) -> impl Iterator<Item = &Pin> {
        self.nodes
            .get(node_id)
            .map(|node| node.pins(direction))
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.pins.get(id))
    }

    /// Edges touching a pin
    pub fn edges_touching<'a>(&'a self, pin_id: &'a PinId) -> impl Iterator<Item = &'a Edge> {
        self.edges().filter(move |e| e.involves_pin(pin_id))
    }

    /// Edges ending at an input pin
    pub fn incoming<'a>(&'a self, pin_id: &'a PinId) -> impl Iterator<Item = &'a Edge> {
        self.edges().filter(move |e| e.to == *pin_id)
    }

    /// The edge joining `from` to `to`, if any
    pub fn edge_between(&self, from: &PinId, to: &PinId) -> Option<&Edge> {
        self.edges().find(|e| e.joins(from, to))
    }

    /// Currently selected nodes
    pub fn selected_nodes(&self) -> &IndexSet<NodeId> {
        &self.selected_nodes
    }

    /// Currently selected edges
    pub fn selected_edges(&self) -> &IndexSet<EdgeId> {
        &self.selected_edges
    }

    /// Whether a node is selected
    pub fn is_node_selected(&self, node_id: &NodeId) -> bool {
        self.selected_nodes.contains(node_id)
    }

    /// Whether nothing at all is selected
    pub fn selection_is_empty(&self) -> bool {
        self.selected_nodes.is_empty() && self.selected_edges.is_empty()
    }

    /// Current viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Whether an input pin accepts at most one incoming edge
    pub fn single_input_policy(&self) -> bool {
        self.single_input_policy
    }

    /// Whether a node's output may feed its own input
    pub fn allow_same_node_connections(&self) -> bool {
        self.allow_same_node_connections
    }

    /// Insert a node along with the pins it owns, at the top of the paint order
    pub(crate) fn insert_node(&mut self, node: Node, pins: Vec<Pin>) {
        for pin in pins {
            self.pins.insert(pin.id.clone(), pin);
        }
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge at the top of the edge paint order
    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        self.edge_order.push(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Remove an edge, keeping order and selection consistent
    pub(crate) fn remove_edge(&mut self, edge_id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(edge_id)?;
        self.edge_order.retain(|id| id != edge_id);
        self.selected_edges.shift_remove(edge_id);
        Some(edge)
    }

    /// Remove every edge touching a pin, returning how many went
    pub(crate) fn remove_edges_touching(&mut self, pin_id: &PinId) -> usize {
        let doomed: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.involves_pin(pin_id))
            .map(|e| e.id.clone())
            .collect();
        for id in &doomed {
            self.remove_edge(id);
        }
        doomed.len()
    }

    /// Remove a pin, its slot in the owner's list, and every edge touching it
    pub(crate) fn remove_pin(&mut self, pin_id: &PinId) -> Option<Pin> {
        let pin = self.pins.shift_remove(pin_id)?;
        self.remove_edges_touching(pin_id);
        if let Some(node) = self.nodes.get_mut(&pin.node) {
            node.pins_mut(pin.direction).retain(|id| id != pin_id);
        }
        Some(pin)
    }

    /// Remove a node with all of its pins and the edges touching them
    pub(crate) fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let owned: Vec<PinId> = self.nodes.get(node_id)?.all_pins().cloned().collect();
        for pin_id in &owned {
            self.remove_pin(pin_id);
        }
        self.order.retain(|id| id != node_id);
        self.selected_nodes.shift_remove(node_id);
        self.nodes.shift_remove(node_id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when a mutation cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Pin not found
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Position, offset or size has a NaN or infinite component
    #[error("Non-finite geometry for node {0}")]
    NonFiniteGeometry(NodeId),

    /// Index does not address a pin in the node's list
    #[error("Pin index {index} out of range for {len} pins on node {node}")]
    PinIndexOutOfRange {
        /// Node whose list was addressed
        node: NodeId,
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },
}
