// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint graph model.
//!
//! This crate holds the structural core of the blueprint editor:
//! - Nodes with ordered, typed input/output pins
//! - Edges created only through the connection protocol
//! - Pure mutations that turn one graph snapshot into the next
//! - Subset extraction and merging for copy/paste and export
//! - Screen/world viewport transforms
//!
//! ## Architecture
//!
//! A [`Graph`] is an immutable value. Mutations in [`ops`], [`connect`]
//! and [`subset`] take `&Graph` and hand back a new one, so earlier
//! snapshots stay valid for undo. Graphs from outside (files, restored
//! snapshots) enter through [`integrity::replace_graph_state`], which
//! re-establishes every invariant before the value becomes live.

pub mod connect;
pub mod edge;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod integrity;
pub mod node;
pub mod ops;
pub mod pin;
pub mod preset;
pub mod subset;

pub use connect::{check_connection, connect_pins, disconnect_pin, ConnectError};
pub use edge::{Edge, EdgeId};
pub use geometry::{Bounds, Point, Size, Viewport};
pub use graph::{Graph, GraphError};
pub use ids::IdAllocator;
pub use integrity::{replace_graph_state, validate, RepairReport, Violation};
pub use node::{Node, NodeFlags, NodeId};
pub use ops::NewNode;
pub use pin::{Pin, PinDirection, PinId, PinPatch, PinShape, PinTemplate};
pub use preset::{CatalogError, Preset, PresetCatalog};
pub use subset::{build_subset_for_selection, merge_subset_at, GraphSubset};
