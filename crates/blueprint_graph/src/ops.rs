// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pure graph mutations.
//!
//! Every function takes the current graph by reference and returns a new
//! graph (or an error, leaving the input untouched). Nothing here keeps
//! state between calls; IDs come from the [`IdAllocator`] the caller
//! passes in.

use crate::edge::EdgeId;
use crate::geometry::{Point, Size, Viewport};
use crate::graph::{Graph, GraphError};
use crate::ids::IdAllocator;
use crate::integrity::sanitize;
use crate::node::{default_size, Node, NodeFlags, NodeId, DEFAULT_NODE_TITLE};
use crate::pin::{Pin, PinDirection, PinId, PinPatch, PinTemplate};
use serde::{Deserialize, Serialize};

/// World-space offset applied to duplicated nodes
pub const DUPLICATE_OFFSET: Point = Point::new(40.0, 40.0);

/// Request to create a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    /// Top-left corner in world space
    pub position: Point,
    /// Title, defaults to [`DEFAULT_NODE_TITLE`]
    pub title: Option<String>,
    /// Pins to create with the node, in order
    #[serde(default)]
    pub pins: Vec<PinTemplate>,
    /// Display flags
    #[serde(default)]
    pub flags: NodeFlags,
}

impl NewNode {
    /// Request an untitled node with no pins at `position`
    pub fn at(position: Point) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Set the title
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a pin declaration
    pub fn with_pin(mut self, pin: PinTemplate) -> Self {
        self.pins.push(pin);
        self
    }

    /// Replace the pin declarations
    pub fn with_pins(mut self, pins: impl IntoIterator<Item = PinTemplate>) -> Self {
        self.pins = pins.into_iter().collect();
        self
    }
}

/// Build a node plus its pins with fresh IDs, without inserting it
fn build_node(graph: &Graph, ids: &mut IdAllocator, request: &NewNode) -> (Node, Vec<Pin>) {
    let node_id = ids.node_id(graph);
    let title = request.title.clone().unwrap_or_else(|| DEFAULT_NODE_TITLE.to_string());
    let mut node = Node::new(node_id.clone(), title, request.position);
    node.flags = request.flags.clone();

    let mut pins = Vec::with_capacity(request.pins.len());
    for template in &request.pins {
        let pin = Pin::from_template(ids.pin_id(graph), node_id.clone(), template);
        node.pins_mut(pin.direction).push(pin.id.clone());
        pins.push(pin);
    }
    node.size = default_size(node.row_count());
    (node, pins)
}

/// Create a node with its declared pins and select exactly it
pub fn create_node(graph: &Graph, ids: &mut IdAllocator, request: &NewNode) -> (Graph, NodeId) {
    let mut next = graph.clone();
    let (node, pins) = build_node(&next, ids, request);
    let node_id = node.id.clone();
    next.insert_node(node, pins);
    next.selected_nodes.clear();
    next.selected_edges.clear();
    next.selected_nodes.insert(node_id.clone());
    (next, node_id)
}

/// Delete every selected node (with its pins and their edges) and every
/// selected edge. No-op when nothing is selected.
pub fn delete_selection(graph: &Graph) -> Graph {
    if graph.selection_is_empty() {
        return graph.clone();
    }
    let mut next = graph.clone();
    let edges: Vec<EdgeId> = next.selected_edges.iter().cloned().collect();
    for edge_id in &edges {
        next.remove_edge(edge_id);
    }
    let nodes: Vec<NodeId> = next.selected_nodes.iter().cloned().collect();
    for node_id in &nodes {
        next.remove_node(node_id);
    }
    next.selected_nodes.clear();
    next.selected_edges.clear();
    next
}

/// Delete the selected edges, keeping the node selection
pub fn delete_selected_edges(graph: &Graph) -> Graph {
    if graph.selected_edges.is_empty() {
        return graph.clone();
    }
    let mut next = graph.clone();
    for edge_id in &graph.selected_edges {
        next.remove_edge(edge_id);
    }
    next.selected_edges.clear();
    next
}

/// Delete one edge
pub fn delete_edge(graph: &Graph, edge_id: &EdgeId) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    next.remove_edge(edge_id)
        .ok_or_else(|| GraphError::EdgeNotFound(edge_id.clone()))?;
    Ok(next)
}

/// Copy every selected node with fresh IDs, offset by [`DUPLICATE_OFFSET`].
///
/// Edges are not copied. The copies become the new selection.
pub fn duplicate_selection(graph: &Graph, ids: &mut IdAllocator) -> Graph {
    if graph.selected_nodes.is_empty() {
        return graph.clone();
    }
    let mut next = graph.clone();
    let sources: Vec<NodeId> = graph
        .order
        .iter()
        .filter(|id| graph.selected_nodes.contains(*id))
        .cloned()
        .collect();

    let mut copies = Vec::with_capacity(sources.len());
    for source_id in &sources {
        let Some(source) = graph.node(source_id) else {
            continue;
        };
        let copy_id = ids.node_id(&next);
        let mut copy = source.clone();
        copy.id = copy_id.clone();
        copy.position = source.position.offset(DUPLICATE_OFFSET.x, DUPLICATE_OFFSET.y);
        copy.inputs.clear();
        copy.outputs.clear();

        let mut pins = Vec::new();
        for pin_id in source.all_pins() {
            let Some(pin) = graph.pin(pin_id) else {
                continue;
            };
            let mut fresh = pin.clone();
            fresh.id = ids.pin_id(&next);
            fresh.node = copy_id.clone();
            copy.pins_mut(fresh.direction).push(fresh.id.clone());
            pins.push(fresh);
        }
        // Reserve the IDs before allocating for the next copy
        next.insert_node(copy, pins);
        copies.push(copy_id);
    }

    next.selected_nodes = copies.into_iter().collect();
    next.selected_edges.clear();
    next
}

/// Translate every selected node by `(dx, dy)`. Zero or non-finite
/// deltas leave the graph unchanged.
pub fn move_selection_by(graph: &Graph, dx: f64, dy: f64) -> Graph {
    let mut next = graph.clone();
    if (dx == 0.0 && dy == 0.0) || !dx.is_finite() || !dy.is_finite() {
        return next;
    }
    for node_id in &graph.selected_nodes {
        if let Some(node) = next.nodes.get_mut(node_id) {
            node.position = node.position.offset(dx, dy);
        }
    }
    next
}

/// Move one node to an absolute position
pub fn set_node_position(graph: &Graph, node_id: &NodeId, position: Point) -> Result<Graph, GraphError> {
    if !position.is_finite() {
        return Err(GraphError::NonFiniteGeometry(node_id.clone()));
    }
    let mut next = graph.clone();
    node_mut(&mut next, node_id)?.position = position;
    Ok(next)
}

/// Change a node's title
pub fn rename_node(graph: &Graph, node_id: &NodeId, title: impl Into<String>) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    node_mut(&mut next, node_id)?.title = title.into();
    Ok(next)
}

/// Replace a node's display flags
pub fn set_node_flags(graph: &Graph, node_id: &NodeId, flags: NodeFlags) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    node_mut(&mut next, node_id)?.flags = flags;
    Ok(next)
}

/// Record the measured size of a node
pub fn set_node_size(graph: &Graph, node_id: &NodeId, size: Size) -> Result<Graph, GraphError> {
    if !size.is_finite() {
        return Err(GraphError::NonFiniteGeometry(node_id.clone()));
    }
    let mut next = graph.clone();
    node_mut(&mut next, node_id)?.size = size;
    Ok(next)
}

/// Move nodes to the top of the paint order, keeping their relative order
pub fn bring_to_front(graph: &Graph, node_ids: &[NodeId]) -> Graph {
    let mut next = graph.clone();
    let (front, mut rest): (Vec<NodeId>, Vec<NodeId>) =
        next.order.drain(..).partition(|id| node_ids.contains(id));
    rest.extend(front);
    next.order = rest;
    next
}

fn node_mut<'a>(graph: &'a mut Graph, node_id: &NodeId) -> Result<&'a mut Node, GraphError> {
    graph
        .nodes
        .get_mut(node_id)
        .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))
}

/// Append a pin to the bottom of a node's list
pub fn add_pin(
    graph: &Graph,
    ids: &mut IdAllocator,
    node_id: &NodeId,
    template: &PinTemplate,
) -> Result<(Graph, PinId), GraphError> {
    let mut next = graph.clone();
    if !next.contains_node(node_id) {
        return Err(GraphError::NodeNotFound(node_id.clone()));
    }
    let pin = Pin::from_template(ids.pin_id(&next), node_id.clone(), template);
    let pin_id = pin.id.clone();
    node_mut(&mut next, node_id)?.pins_mut(pin.direction).push(pin_id.clone());
    next.pins.insert(pin_id.clone(), pin);
    Ok((next, pin_id))
}

/// Remove a pin and every edge touching it
pub fn remove_pin(graph: &Graph, pin_id: &PinId) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    next.remove_pin(pin_id)
        .ok_or_else(|| GraphError::PinNotFound(pin_id.clone()))?;
    Ok(next)
}

/// Update a pin's label, type, color or shape
pub fn update_pin(graph: &Graph, pin_id: &PinId, patch: &PinPatch) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    let pin = next
        .pins
        .get_mut(pin_id)
        .ok_or_else(|| GraphError::PinNotFound(pin_id.clone()))?;
    patch.apply(pin);
    Ok(next)
}

/// Splice one pin from `from_index` to `to_index` within a node's list.
///
/// `to_index` is clamped to the list; `from_index` must address a pin.
pub fn reorder_pin(
    graph: &Graph,
    node_id: &NodeId,
    direction: PinDirection,
    from_index: usize,
    to_index: usize,
) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    let list = node_mut(&mut next, node_id)?.pins_mut(direction);
    if from_index >= list.len() {
        return Err(GraphError::PinIndexOutOfRange {
            node: node_id.clone(),
            index: from_index,
            len: list.len(),
        });
    }
    let to_index = to_index.min(list.len() - 1);
    if from_index != to_index {
        let pin = list.remove(from_index);
        list.insert(to_index, pin);
    }
    Ok(next)
}

/// Place a pin at `to_index` within its node's list.
///
/// Repeating the same call leaves the graph unchanged, which is what live
/// drag-reorder feedback needs.
pub fn move_pin_to(graph: &Graph, pin_id: &PinId, to_index: usize) -> Result<Graph, GraphError> {
    let pin = graph
        .pin(pin_id)
        .ok_or_else(|| GraphError::PinNotFound(pin_id.clone()))?;
    let node = graph
        .node(&pin.node)
        .ok_or_else(|| GraphError::NodeNotFound(pin.node.clone()))?;
    let from_index = node
        .pins(pin.direction)
        .iter()
        .position(|id| id == pin_id)
        .ok_or_else(|| GraphError::PinNotFound(pin_id.clone()))?;
    reorder_pin(graph, &pin.node, pin.direction, from_index, to_index)
}

/// Replace the selection, silently dropping IDs that do not exist
pub fn set_selection(graph: &Graph, nodes: &[NodeId], edges: &[EdgeId]) -> Graph {
    let mut next = graph.clone();
    next.selected_nodes = nodes.iter().filter(|id| graph.contains_node(id)).cloned().collect();
    next.selected_edges = edges.iter().filter(|id| graph.contains_edge(id)).cloned().collect();
    next
}

/// Select exactly these nodes
pub fn select_nodes(graph: &Graph, nodes: &[NodeId]) -> Graph {
    set_selection(graph, nodes, &[])
}

/// Add or remove one node from the selection
pub fn toggle_node_selection(graph: &Graph, node_id: &NodeId) -> Graph {
    let mut next = graph.clone();
    if !next.selected_nodes.shift_remove(node_id) && graph.contains_node(node_id) {
        next.selected_nodes.insert(node_id.clone());
    }
    next
}

/// Select every node
pub fn select_all(graph: &Graph) -> Graph {
    let mut next = graph.clone();
    next.selected_nodes = graph.order.iter().cloned().collect();
    next
}

/// Empty both selections
pub fn clear_selection(graph: &Graph) -> Graph {
    let mut next = graph.clone();
    next.selected_nodes.clear();
    next.selected_edges.clear();
    next
}

/// Replace the viewport, clamping its zoom
pub fn set_viewport(graph: &Graph, viewport: Viewport) -> Graph {
    let mut next = graph.clone();
    next.viewport = viewport.normalized();
    next
}

/// Shift the pan by `(dx, dy)` screen pixels
pub fn pan_by(graph: &Graph, dx: f64, dy: f64) -> Graph {
    set_viewport(graph, graph.viewport.panned(dx, dy))
}

/// Zoom by `factor` around a screen point
pub fn zoom_at_screen_point(graph: &Graph, cursor: Point, factor: f64) -> Graph {
    set_viewport(graph, graph.viewport.zoom_at_point(cursor, factor))
}

/// Toggle the single-input policy.
///
/// Turning it on drops all but the earliest incoming edge of each input.
pub fn set_single_input_policy(graph: &Graph, enabled: bool) -> Graph {
    let mut next = graph.clone();
    next.single_input_policy = enabled;
    sanitize(&mut next);
    next
}

/// Toggle same-node connections.
///
/// Turning them off drops every edge between two pins of one node.
pub fn set_allow_same_node_connections(graph: &Graph, allowed: bool) -> Graph {
    let mut next = graph.clone();
    next.allow_same_node_connections = allowed;
    sanitize(&mut next);
    next
}

/// Recolor an edge
pub fn set_edge_color(graph: &Graph, edge_id: &EdgeId, color: impl Into<String>) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    next.edges
        .get_mut(edge_id)
        .ok_or_else(|| GraphError::EdgeNotFound(edge_id.clone()))?
        .color = color.into();
    Ok(next)
}
