// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin connection protocol.
//!
//! Pins may be handed over in either order. Exactly one must be an output
//! and one an input; the output becomes the edge source. Under the
//! single-input policy a new connection replaces whatever already feeds
//! the input ("last connection wins") instead of being rejected.

use crate::edge::{Edge, EdgeId};
use crate::graph::Graph;
use crate::ids::IdAllocator;
use crate::pin::{Pin, PinId};

/// Why a connection request was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// One of the pins does not exist
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    /// Both pins are inputs or both are outputs
    #[error("Pins must be one output and one input")]
    DirectionMismatch,

    /// Both pins belong to the same node and that is not allowed
    #[error("Connecting a node to itself is not allowed")]
    SameNodeForbidden,

    /// The exact edge already exists
    #[error("Pins are already connected")]
    DuplicateConnection,
}

/// Resolve and orient a candidate connection without changing anything.
///
/// Returns `(output, input)` on success. The canvas uses this to preview
/// whether a drop target would be accepted.
pub fn check_connection<'a>(
    graph: &'a Graph,
    a: &PinId,
    b: &PinId,
) -> Result<(&'a Pin, &'a Pin), ConnectError> {
    let first = graph.pin(a).ok_or_else(|| ConnectError::PinNotFound(a.clone()))?;
    let second = graph.pin(b).ok_or_else(|| ConnectError::PinNotFound(b.clone()))?;

    let (output, input) = match (first.is_output(), second.is_output()) {
        (true, false) => (first, second),
        (false, true) => (second, first),
        _ => return Err(ConnectError::DirectionMismatch),
    };

    if !graph.allow_same_node_connections && output.node == input.node {
        return Err(ConnectError::SameNodeForbidden);
    }
    if graph.edge_between(&output.id, &input.id).is_some() {
        return Err(ConnectError::DuplicateConnection);
    }
    Ok((output, input))
}

/// Connect two pins, returning the new graph and the new edge's ID
pub fn connect_pins(
    graph: &Graph,
    ids: &mut IdAllocator,
    a: &PinId,
    b: &PinId,
) -> Result<(Graph, EdgeId), ConnectError> {
    let (output, input) = check_connection(graph, a, b)?;
    let (from, to) = (output.id.clone(), input.id.clone());

    let mut next = graph.clone();
    if next.single_input_policy {
        let replaced: Vec<EdgeId> = next.incoming(&to).map(|e| e.id.clone()).collect();
        for edge_id in &replaced {
            next.remove_edge(edge_id);
        }
    }

    let edge_id = ids.edge_id(&next);
    next.insert_edge(Edge::new(edge_id.clone(), from, to));
    Ok((next, edge_id))
}

/// Remove every edge touching a pin. No-op if there are none.
pub fn disconnect_pin(graph: &Graph, pin_id: &PinId) -> Graph {
    let mut next = graph.clone();
    next.remove_edges_touching(pin_id);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::integrity::validate;
    use crate::node::NodeId;
    use crate::ops::{create_node, NewNode};
    use crate::pin::{PinDirection, PinTemplate};

    struct Fixture {
        graph: Graph,
        ids: IdAllocator,
    }

    impl Fixture {
        fn new(single_input: bool, same_node: bool) -> Self {
            Self {
                graph: Graph::with_policies(single_input, same_node),
                ids: IdAllocator::new(),
            }
        }

        fn node(&mut self, inputs: &[&str], outputs: &[&str]) -> NodeId {
            let request = NewNode::at(Point::default()).with_pins(
                    inputs
                        .iter()
                        .map(|l| PinTemplate::input(*l))
                        .chain(outputs.iter().map(|l| PinTemplate::output(*l))),
                );
            let (graph, id) = create_node(&self.graph, &mut self.ids, &request);
            self.graph = graph;
            id
        }

        fn pin(&self, node: &NodeId, direction: PinDirection) -> PinId {
            self.graph.node(node).unwrap().pins(direction)[0].clone()
        }
    }

    #[test]
    fn test_connect_either_order() {
        let mut fx = Fixture::new(true, false);
        let a = fx.node(&[], &["out"]);
        let b = fx.node(&["in"], &[]);
        let out_a = fx.pin(&a, PinDirection::Output);
        let in_b = fx.pin(&b, PinDirection::Input);

        let (graph, edge_id) = connect_pins(&fx.graph, &mut fx.ids, &in_b, &out_a).unwrap();
        let edge = graph.edge(&edge_id).unwrap();
        assert_eq!(edge.from, out_a);
        assert_eq!(edge.to, in_b);
        assert_eq!(graph.edge_order(), &[edge_id]);
        assert!(validate(&graph).is_empty());
    }

    #[test]
    fn test_unknown_pin() {
        let mut fx = Fixture::new(true, false);
        let a = fx.node(&[], &["out"]);
        let out_a = fx.pin(&a, PinDirection::Output);
        let ghost = PinId::new("ghost");
        assert_eq!(
            connect_pins(&fx.graph, &mut fx.ids, &out_a, &ghost),
            Err(ConnectError::PinNotFound(ghost))
        );
    }

    #[test]
    fn test_direction_mismatch() {
        let mut fx = Fixture::new(true, false);
        let a = fx.node(&["in"], &["out"]);
        let b = fx.node(&["in"], &["out"]);
        let in_a = fx.pin(&a, PinDirection::Input);
        let in_b = fx.pin(&b, PinDirection::Input);
        let out_a = fx.pin(&a, PinDirection::Output);
        let out_b = fx.pin(&b, PinDirection::Output);
        assert_eq!(
            connect_pins(&fx.graph, &mut fx.ids, &in_a, &in_b),
            Err(ConnectError::DirectionMismatch)
        );
        assert_eq!(
            connect_pins(&fx.graph, &mut fx.ids, &out_a, &out_b),
            Err(ConnectError::DirectionMismatch)
        );
    }

    #[test]
    fn test_same_node_policy() {
        let mut strict = Fixture::new(true, false);
        let a = strict.node(&["in"], &["out"]);
        let (out_a, in_a) = (strict.pin(&a, PinDirection::Output), strict.pin(&a, PinDirection::Input));
        assert_eq!(
            connect_pins(&strict.graph, &mut strict.ids, &out_a, &in_a),
            Err(ConnectError::SameNodeForbidden)
        );

        let mut loose = Fixture::new(true, true);
        let a = loose.node(&["in"], &["out"]);
        let (out_a, in_a) = (loose.pin(&a, PinDirection::Output), loose.pin(&a, PinDirection::Input));
        assert!(connect_pins(&loose.graph, &mut loose.ids, &out_a, &in_a).is_ok());
    }

    #[test]
    fn test_duplicate_connection_leaves_graph_unchanged() {
        let mut fx = Fixture::new(false, false);
        let a = fx.node(&[], &["out"]);
        let b = fx.node(&["in"], &[]);
        let out_a = fx.pin(&a, PinDirection::Output);
        let in_b = fx.pin(&b, PinDirection::Input);

        let (graph, _) = connect_pins(&fx.graph, &mut fx.ids, &out_a, &in_b).unwrap();
        assert_eq!(
            connect_pins(&graph, &mut fx.ids, &out_a, &in_b),
            Err(ConnectError::DuplicateConnection)
        );
        assert_eq!(
            connect_pins(&graph, &mut fx.ids, &in_b, &out_a),
            Err(ConnectError::DuplicateConnection)
        );
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_single_input_replaces_existing_edge() {
        let mut fx = Fixture::new(true, false);
        let a = fx.node(&[], &["outA"]);
        let b = fx.node(&["inB"], &[]);
        let out_a = fx.pin(&a, PinDirection::Output);
        let in_b = fx.pin(&b, PinDirection::Input);

        let (graph, _) = connect_pins(&fx.graph, &mut fx.ids, &out_a, &in_b).unwrap();
        assert_eq!(graph.edge_order().len(), 1);

        fx.graph = graph;
        let c = fx.node(&[], &["outC"]);
        let out_c = fx.pin(&c, PinDirection::Output);
        let (graph, edge_id) = connect_pins(&fx.graph, &mut fx.ids, &out_c, &in_b).unwrap();
        assert_eq!(graph.edge_order().len(), 1);
        assert_eq!(graph.edge(&edge_id).unwrap().from, out_c);
        assert!(validate(&graph).is_empty());
    }

    #[test]
    fn test_multi_input_keeps_both_edges() {
        let mut fx = Fixture::new(false, false);
        let a = fx.node(&[], &["out"]);
        let c = fx.node(&[], &["out"]);
        let b = fx.node(&["in"], &[]);
        let out_a = fx.pin(&a, PinDirection::Output);
        let out_c = fx.pin(&c, PinDirection::Output);
        let in_b = fx.pin(&b, PinDirection::Input);

        let (graph, _) = connect_pins(&fx.graph, &mut fx.ids, &out_a, &in_b).unwrap();
        let (graph, _) = connect_pins(&graph, &mut fx.ids, &out_c, &in_b).unwrap();
        assert_eq!(graph.incoming(&in_b).count(), 2);
    }

    #[test]
    fn test_disconnect_pin() {
        let mut fx = Fixture::new(false, false);
        let a = fx.node(&[], &["out"]);
        let b = fx.node(&["in"], &[]);
        let c = fx.node(&["in"], &[]);
        let out_a = fx.pin(&a, PinDirection::Output);
        let in_b = fx.pin(&b, PinDirection::Input);
        let in_c = fx.pin(&c, PinDirection::Input);

        let (graph, _) = connect_pins(&fx.graph, &mut fx.ids, &out_a, &in_b).unwrap();
        let (graph, _) = connect_pins(&graph, &mut fx.ids, &out_a, &in_c).unwrap();
        let next = disconnect_pin(&graph, &out_a);
        assert_eq!(next.edge_count(), 0);
        assert!(next.edge_order().is_empty());
        assert_eq!(disconnect_pin(&next, &out_a), next);
    }
}
