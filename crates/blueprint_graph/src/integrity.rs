// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural invariants: checking them and re-establishing them.
//!
//! [`validate`] reports every violation in a graph. [`replace_graph_state`]
//! is the only way a graph built outside this crate (a loaded document,
//! a restored snapshot) becomes live: it repairs the incoming value by
//! dropping whatever dangles, deterministically.

use crate::edge::EdgeId;
use crate::geometry::{Point, MAX_ZOOM, MIN_ZOOM};
use crate::graph::Graph;
use crate::node::{default_size, NodeId};
use crate::pin::{PinDirection, PinId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A broken graph invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Map key differs from the entity's own ID
    KeyMismatch(String),
    /// Pin's owning node does not exist
    PinOwnerMissing(PinId),
    /// Pin is not listed exactly once by its owner, in the right list
    PinListing(PinId),
    /// Node lists a pin that is missing, foreign, or in the wrong list
    ForeignPin(NodeId, PinId),
    /// Edge endpoint does not resolve
    EdgeEndpointMissing(EdgeId),
    /// Edge source is not an output or destination is not an input
    EdgeDirection(EdgeId),
    /// Edge joins two pins of one node while that is forbidden
    SameNodeEdge(EdgeId),
    /// Two edges join the same pin pair
    DuplicateEdge(EdgeId),
    /// Input pin has several incoming edges under the single-input policy
    MultipleIncoming(PinId),
    /// `order` is not a permutation of the node IDs
    NodeOrder,
    /// `edgeOrder` is not a permutation of the edge IDs
    EdgeOrder,
    /// Selection holds a node that does not exist
    StaleNodeSelection(NodeId),
    /// Selection holds an edge that does not exist
    StaleEdgeSelection(EdgeId),
    /// Node position or size is not finite
    NonFiniteGeometry(NodeId),
    /// Zoom outside the allowed range
    ZoomOutOfRange,
}

/// Check every structural invariant and list the violations found
pub fn validate(graph: &Graph) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (key, node) in &graph.nodes {
        if *key != node.id {
            violations.push(Violation::KeyMismatch(key.to_string()));
        }
        if !node.position.is_finite() || !node.size.is_finite() {
            violations.push(Violation::NonFiniteGeometry(node.id.clone()));
        }
        for direction in [PinDirection::Input, PinDirection::Output] {
            for pin_id in node.pins(direction) {
                let owned = graph
                    .pins
                    .get(pin_id)
                    .is_some_and(|p| p.node == node.id && p.direction == direction);
                if !owned {
                    violations.push(Violation::ForeignPin(node.id.clone(), pin_id.clone()));
                }
            }
        }
    }

    for (key, pin) in &graph.pins {
        if *key != pin.id {
            violations.push(Violation::KeyMismatch(key.to_string()));
        }
        match graph.nodes.get(&pin.node) {
            None => violations.push(Violation::PinOwnerMissing(pin.id.clone())),
            Some(node) => {
                let listed = node.pins(pin.direction).iter().filter(|id| **id == pin.id).count();
                if listed != 1 {
                    violations.push(Violation::PinListing(pin.id.clone()));
                }
            }
        }
    }

    let mut pairs = HashSet::new();
    let mut fed = HashSet::new();
    for (key, edge) in &graph.edges {
        if *key != edge.id {
            violations.push(Violation::KeyMismatch(key.to_string()));
        }
        let (Some(from), Some(to)) = (graph.pins.get(&edge.from), graph.pins.get(&edge.to)) else {
            violations.push(Violation::EdgeEndpointMissing(edge.id.clone()));
            continue;
        };
        if !from.is_output() || !to.is_input() {
            violations.push(Violation::EdgeDirection(edge.id.clone()));
        }
        if !graph.allow_same_node_connections && from.node == to.node {
            violations.push(Violation::SameNodeEdge(edge.id.clone()));
        }
        if !pairs.insert((&edge.from, &edge.to)) {
            violations.push(Violation::DuplicateEdge(edge.id.clone()));
        }
        if graph.single_input_policy && !fed.insert(&edge.to) {
            violations.push(Violation::MultipleIncoming(edge.to.clone()));
        }
    }

    if !is_permutation(&graph.order, graph.nodes.keys()) {
        violations.push(Violation::NodeOrder);
    }
    if !is_permutation(&graph.edge_order, graph.edges.keys()) {
        violations.push(Violation::EdgeOrder);
    }

    for id in &graph.selected_nodes {
        if !graph.nodes.contains_key(id) {
            violations.push(Violation::StaleNodeSelection(id.clone()));
        }
    }
    for id in &graph.selected_edges {
        if !graph.edges.contains_key(id) {
            violations.push(Violation::StaleEdgeSelection(id.clone()));
        }
    }

    let zoom = graph.viewport.zoom;
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        violations.push(Violation::ZoomOutOfRange);
    }

    violations
}

fn is_permutation<'a, T: Eq + std::hash::Hash + 'a>(
    order: &[T],
    live: impl ExactSizeIterator<Item = &'a T>,
) -> bool {
    if order.len() != live.len() {
        return false;
    }
    let seen: HashSet<&T> = order.iter().collect();
    seen.len() == order.len() && live.into_iter().all(|id| seen.contains(id))
}

/// What [`replace_graph_state`] had to change to make a graph consistent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Nodes dropped because their map key disagreed with their ID
    pub dropped_nodes: usize,
    /// Pins dropped for a missing owner or a key mismatch
    pub dropped_pins: usize,
    /// Node pin lists that had to be rewritten
    pub rewritten_pin_lists: usize,
    /// Edges dropped for any reason
    pub dropped_edges: usize,
    /// Whether `order` or `edgeOrder` had to be rebuilt
    pub rebuilt_order: bool,
    /// Stale selection entries dropped
    pub dropped_selection: usize,
    /// Whether the viewport had to be normalised
    pub normalized_viewport: bool,
    /// Nodes whose non-finite position or size was reset
    #[serde(default)]
    pub reset_geometry: usize,
}

impl RepairReport {
    /// Whether the graph was already consistent
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Accept an externally built graph as the new live state.
///
/// The incoming value is repaired rather than rejected: dangling
/// references are dropped, orders are rebuilt as permutations, and edges
/// that break a connection policy are removed with the first edge in
/// `edgeOrder` winning. The returned graph always passes [`validate`].
pub fn replace_graph_state(incoming: Graph) -> (Graph, RepairReport) {
    let mut graph = incoming;
    let report = sanitize(&mut graph);
    if !report.is_clean() {
        tracing::warn!(
            dropped_nodes = report.dropped_nodes,
            dropped_pins = report.dropped_pins,
            dropped_edges = report.dropped_edges,
            rewritten_pin_lists = report.rewritten_pin_lists,
            "Repaired inconsistent graph on ingestion"
        );
    }
    (graph, report)
}

/// Re-establish every invariant in place
pub(crate) fn sanitize(graph: &mut Graph) -> RepairReport {
    let mut report = RepairReport::default();

    let before = graph.nodes.len();
    graph.nodes.retain(|key, node| *key == node.id);
    report.dropped_nodes = before - graph.nodes.len();
    report.reset_geometry = reset_geometry(graph);

    let before = graph.pins.len();
    let nodes = &graph.nodes;
    graph
        .pins
        .retain(|key, pin| *key == pin.id && nodes.contains_key(&pin.node));
    report.dropped_pins = before - graph.pins.len();

    report.rewritten_pin_lists = rebuild_pin_lists(graph);
    let (dropped_edges, edge_order_changed) = filter_edges(graph);
    report.dropped_edges = dropped_edges;

    let node_order_changed = rebuild_order(&mut graph.order, graph.nodes.keys());
    report.rebuilt_order = node_order_changed || edge_order_changed;

    let before = graph.selected_nodes.len() + graph.selected_edges.len();
    let nodes = &graph.nodes;
    graph.selected_nodes.retain(|id| nodes.contains_key(id));
    let edges = &graph.edges;
    graph.selected_edges.retain(|id| edges.contains_key(id));
    report.dropped_selection = before - graph.selected_nodes.len() - graph.selected_edges.len();

    let viewport = graph.viewport.normalized();
    report.normalized_viewport = viewport != graph.viewport;
    graph.viewport = viewport;

    report
}

/// Replace non-finite coordinates with zero and non-finite sizes with the
/// default for the node's rows, returning how many nodes changed
fn reset_geometry(graph: &mut Graph) -> usize {
    let mut reset = 0;
    for node in graph.nodes.values_mut() {
        let position_ok = node.position.is_finite();
        let size_ok = node.size.is_finite();
        if !position_ok {
            let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
            node.position = Point::new(finite_or_zero(node.position.x), finite_or_zero(node.position.y));
        }
        if !size_ok {
            node.size = default_size(node.row_count());
        }
        if !(position_ok && size_ok) {
            reset += 1;
        }
    }
    reset
}

/// Make every node list exactly the pins it owns, returning how many lists changed
fn rebuild_pin_lists(graph: &mut Graph) -> usize {
    let mut rewritten: HashSet<NodeId> = HashSet::new();
    let mut claimed: HashSet<PinId> = HashSet::new();

    for node in graph.nodes.values_mut() {
        let node_id = node.id.clone();
        for direction in [PinDirection::Input, PinDirection::Output] {
            let list = node.pins_mut(direction);
            let before = list.len();
            list.retain(|id| {
                graph
                    .pins
                    .get(id)
                    .is_some_and(|p| p.node == node_id && p.direction == direction)
                    && claimed.insert(id.clone())
            });
            if list.len() != before {
                rewritten.insert(node_id.clone());
            }
        }
    }

    // Owned pins no list mentions go to the bottom of their owner's list
    for pin in graph.pins.values() {
        if claimed.contains(&pin.id) {
            continue;
        }
        if let Some(node) = graph.nodes.get_mut(&pin.node) {
            node.pins_mut(pin.direction).push(pin.id.clone());
            rewritten.insert(node.id.clone());
        }
    }
    rewritten.len()
}

/// Drop edges that break an invariant, walking in paint order so the
/// earliest edge wins any conflict. Returns the drop count and whether
/// `edgeOrder` had to change shape.
fn filter_edges(graph: &mut Graph) -> (usize, bool) {
    let before = graph.edges.len();
    graph.edges.retain(|key, edge| *key == edge.id);

    let mut order_changed = rebuild_order(&mut graph.edge_order, graph.edges.keys());

    let mut pairs: HashSet<(PinId, PinId)> = HashSet::new();
    let mut fed: HashSet<PinId> = HashSet::new();
    let mut keep: Vec<EdgeId> = Vec::with_capacity(graph.edge_order.len());
    for id in &graph.edge_order {
        let Some(edge) = graph.edges.get(id) else {
            continue;
        };
        let (Some(from), Some(to)) = (graph.pins.get(&edge.from), graph.pins.get(&edge.to)) else {
            continue;
        };
        if !from.is_output() || !to.is_input() {
            continue;
        }
        if !graph.allow_same_node_connections && from.node == to.node {
            continue;
        }
        if !pairs.insert((edge.from.clone(), edge.to.clone())) {
            continue;
        }
        if graph.single_input_policy && !fed.insert(edge.to.clone()) {
            continue;
        }
        keep.push(id.clone());
    }

    if keep.len() != graph.edge_order.len() {
        let kept: HashSet<&EdgeId> = keep.iter().collect();
        graph.edges.retain(|id, _| kept.contains(id));
        graph.edge_order = keep;
        order_changed = true;
    }

    (before - graph.edges.len(), order_changed)
}

/// Turn `order` into a permutation of `live`, keeping the surviving
/// relative order and appending missing IDs in map order.
fn rebuild_order<'a, T>(order: &mut Vec<T>, live: impl Iterator<Item = &'a T>) -> bool
where
    T: Clone + Eq + std::hash::Hash + 'a,
{
    let live: IndexSet<&T> = live.collect();
    let mut seen: HashSet<T> = HashSet::new();
    let mut rebuilt: Vec<T> = order
        .iter()
        .filter(|id| live.contains(id) && seen.insert((*id).clone()))
        .cloned()
        .collect();
    rebuilt.extend(live.iter().filter(|id| !seen.contains(**id)).map(|id| (*id).clone()));
    let changed = rebuilt != *order;
    *order = rebuilt;
    changed
}
