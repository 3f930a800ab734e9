// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifier allocation.
//!
//! IDs come from a single monotonic counter shared by nodes, pins and
//! edges. The allocator is a plain value owned by whoever drives the
//! mutation layer and is passed explicitly into every allocating call.
//! An ID that is already live in the target graph is skipped, so a graph
//! loaded from disk never collides with freshly created entities.

use crate::edge::EdgeId;
use crate::graph::Graph;
use crate::node::NodeId;
use crate::pin::PinId;
use serde::{Deserialize, Serialize};

/// Monotonic ID allocator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator whose first ID uses `next`
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Value the next allocation will try first
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Take the next counter value. The counter wraps after `u64::MAX`;
    /// the live-ID check in the callers keeps wrapped IDs unique.
    fn bump(&mut self) -> u64 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }

    /// Allocate a node ID not present in `graph`
    pub fn node_id(&mut self, graph: &Graph) -> NodeId {
        loop {
            let id = NodeId(format!("node-{}", self.bump()));
            if !graph.contains_node(&id) {
                return id;
            }
        }
    }

    /// Allocate a pin ID not present in `graph`
    pub fn pin_id(&mut self, graph: &Graph) -> PinId {
        loop {
            let id = PinId(format!("pin-{}", self.bump()));
            if !graph.contains_pin(&id) {
                return id;
            }
        }
    }

    /// Allocate an edge ID not present in `graph`
    pub fn edge_id(&mut self, graph: &Graph) -> EdgeId {
        loop {
            let id = EdgeId(format!("edge-{}", self.bump()));
            if !graph.contains_edge(&id) {
                return id;
            }
        }
    }

    /// Advance past every numeric suffix used by IDs in `graph`.
    ///
    /// Called after ingesting a foreign graph so later allocations do not
    /// have to skip over its IDs one by one.
    pub fn reserve_past(&mut self, graph: &Graph) {
        let highest = graph
            .nodes
            .keys()
            .map(NodeId::as_str)
            .chain(graph.pins.keys().map(PinId::as_str))
            .chain(graph.edges.keys().map(EdgeId::as_str))
            .filter_map(numeric_suffix)
            .max();
        // A suffix at the top of the range leaves nothing to reserve;
        // allocation then wraps and skips live IDs instead
        if let Some(highest) = highest.and_then(|h| h.checked_add(1)) {
            self.next = self.next.max(highest);
        }
    }
}

fn numeric_suffix(id: &str) -> Option<u64> {
    let (_, tail) = id.rsplit_once('-')?;
    tail.parse().ok()
}
