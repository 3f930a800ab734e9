// SPDX-License-Identifier: MIT OR Apache-2.0
//! Induced subgraphs for copy/paste and export.
//!
//! [`build_subset_for_selection`] cuts the selected nodes out of a graph
//! together with their pins and the edges running strictly between them.
//! [`merge_subset_at`] is its inverse: every ID is remapped to a fresh one
//! and the block is re-centered on a target point.

use crate::edge::{Edge, EdgeId};
use crate::geometry::{Bounds, Point};
use crate::graph::Graph;
use crate::ids::IdAllocator;
use crate::integrity::sanitize;
use crate::node::{Node, NodeId};
use crate::pin::{Pin, PinId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A self-contained slice of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSubset {
    /// Nodes in paint order
    pub nodes: Vec<Node>,
    /// Pins owned by those nodes
    pub pins: Vec<Pin>,
    /// Edges whose both endpoints are among `pins`
    pub edges: Vec<Edge>,
    /// Bounding box of the node rectangles
    pub bounds: Bounds,
}

impl GraphSubset {
    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bounds recomputed from the node rectangles
    pub fn node_bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.nodes.iter().map(|n| (n.position, n.size)))
    }
}

/// Extract the subgraph induced by the selected nodes.
///
/// Returns `None` when no node is selected.
pub fn build_subset_for_selection(graph: &Graph) -> Option<GraphSubset> {
    let nodes: Vec<Node> = graph
        .nodes()
        .filter(|n| graph.is_node_selected(&n.id))
        .cloned()
        .collect();
    let bounds = Bounds::enclosing(nodes.iter().map(|n| (n.position, n.size)))?;

    let pins: Vec<Pin> = nodes
        .iter()
        .flat_map(Node::all_pins)
        .filter_map(|id| graph.pin(id))
        .cloned()
        .collect();
    let pin_ids: HashSet<&PinId> = pins.iter().map(|p| &p.id).collect();
    let edges: Vec<Edge> = graph
        .edges()
        .filter(|e| pin_ids.contains(&e.from) && pin_ids.contains(&e.to))
        .cloned()
        .collect();

    Some(GraphSubset {
        nodes,
        pins,
        edges,
        bounds,
    })
}

/// Insert a subset with fresh IDs, centered on `target`, and select it.
///
/// Incoming IDs are never reused. The subset is not trusted: pins whose
/// owner is not in the subset, edges whose endpoints are not, and edges
/// that break the target graph's connection policies are dropped.
pub fn merge_subset_at(
    graph: &Graph,
    ids: &mut IdAllocator,
    subset: &GraphSubset,
    target: Point,
) -> Graph {
    let Some(bounds) = subset.node_bounds() else {
        return graph.clone();
    };
    let center = bounds.center();
    let (dx, dy) = (target.x - center.x, target.y - center.y);

    let mut next = graph.clone();
    let mut node_map: HashMap<&NodeId, NodeId> = HashMap::new();
    let mut pin_map: HashMap<&PinId, PinId> = HashMap::new();
    let mut pasted: Vec<NodeId> = Vec::with_capacity(subset.nodes.len());

    for node in &subset.nodes {
        if node_map.contains_key(&node.id) {
            continue;
        }
        let fresh = ids.node_id(&next);
        // Claim the ID right away so later allocations skip it
        next.insert_node(Node::new(fresh.clone(), node.title.clone(), Point::default()), Vec::new());
        node_map.insert(&node.id, fresh.clone());
        pasted.push(fresh);
    }

    for pin in &subset.pins {
        let Some(owner) = node_map.get(&pin.node) else {
            continue;
        };
        if pin_map.contains_key(&pin.id) {
            continue;
        }
        let mut fresh = pin.clone();
        fresh.id = ids.pin_id(&next);
        fresh.node = owner.clone();
        pin_map.insert(&pin.id, fresh.id.clone());
        next.pins.insert(fresh.id.clone(), fresh);
    }

    let mut seen = HashSet::new();
    for node in &subset.nodes {
        if !seen.insert(&node.id) {
            continue;
        }
        let Some(fresh_id) = node_map.get(&node.id) else {
            continue;
        };
        let mut fresh = node.clone();
        fresh.id = fresh_id.clone();
        fresh.position = node.position.offset(dx, dy);
        fresh.inputs = node.inputs.iter().filter_map(|p| pin_map.get(p).cloned()).collect();
        fresh.outputs = node.outputs.iter().filter_map(|p| pin_map.get(p).cloned()).collect();
        next.nodes.insert(fresh_id.clone(), fresh);
    }

    for edge in &subset.edges {
        let (Some(from), Some(to)) = (pin_map.get(&edge.from), pin_map.get(&edge.to)) else {
            continue;
        };
        let edge_id: EdgeId = ids.edge_id(&next);
        next.insert_edge(Edge {
            id: edge_id,
            from: from.clone(),
            to: to.clone(),
            color: edge.color.clone(),
        });
    }

    next.selected_nodes = pasted.into_iter().collect();
    next.selected_edges.clear();
    // The live part is already consistent; this only fixes up the pasted block
    sanitize(&mut next);
    next
}
