// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor store: the single mutable state the canvas talks to.
//!
//! The store holds no graph logic of its own. It keeps the current
//! snapshot of every open document, runs the pure mutations from
//! [`blueprint_graph`], and decides which of them reach the undo history.
//! Only the active document is edited; switching documents swaps in that
//! document's own graph and history.

use crate::clipboard::{ClipboardEnvelope, ClipboardError};
use crate::config::StoreConfig;
use crate::document::{Document, DocumentError, DocumentId, DocumentMeta, ExportPreferences, Theme};
use crate::history::History;
use blueprint_graph::connect::{self, ConnectError};
use blueprint_graph::ops::{self, NewNode};
use blueprint_graph::preset::{self, CatalogError, PresetCatalog};
use blueprint_graph::subset::{self, GraphSubset};
use blueprint_graph::{
    replace_graph_state, EdgeId, Graph, GraphError, IdAllocator, NodeFlags, NodeId, PinDirection, PinId,
    PinPatch, PinTemplate, Point, RepairReport, Size, Viewport,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Process-wide handle to the store
pub type SharedStore = Arc<RwLock<Store>>;

/// Whether a change is recorded in the undo history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Nodes, pins or edges changed: undoable
    Content,
    /// Selection, viewport, measured sizes or policy flags: not undoable
    View,
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Mutation refused
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Connection refused
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Preset lookup failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Clipboard payload rejected
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    /// Document error
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// One open document
#[derive(Debug)]
pub struct DocumentContext {
    meta: DocumentMeta,
    graph: Arc<Graph>,
    history: History,
    dirty: bool,
}

impl DocumentContext {
    fn new(meta: DocumentMeta, graph: Graph, history_depth: usize) -> Self {
        Self {
            meta,
            graph: Arc::new(graph),
            history: History::with_max_depth(history_depth),
            dirty: false,
        }
    }

    /// Metadata
    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    /// Current graph snapshot
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Undo/redo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// The editor store
#[derive(Debug)]
pub struct Store {
    active: DocumentContext,
    parked: IndexMap<DocumentId, DocumentContext>,
    ids: IdAllocator,
    catalog: PresetCatalog,
    config: StoreConfig,
}

impl Store {
    /// Create a store with one empty document
    pub fn new(config: StoreConfig, catalog: PresetCatalog) -> Self {
        let active = Self::blank_context(&config);
        tracing::info!("Created document {:?}", active.meta.name);
        Self {
            active,
            parked: IndexMap::new(),
            ids: IdAllocator::new(),
            catalog,
            config,
        }
    }

    /// Create a store using the built-in presets
    pub fn with_builtin_presets(config: StoreConfig) -> Result<Self, StoreError> {
        Ok(Self::new(config, preset::builtin_catalog()?))
    }

    /// Wrap the store in a shared handle
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    fn blank_context(config: &StoreConfig) -> DocumentContext {
        DocumentContext::new(
            DocumentMeta::new(config.default_document_name.clone()),
            Graph::with_policies(config.single_input_policy, config.allow_same_node_connections),
            config.history_depth,
        )
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Preset catalog
    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    /// The active document
    pub fn active(&self) -> &DocumentContext {
        &self.active
    }

    /// ID of the active document
    pub fn active_id(&self) -> DocumentId {
        self.active.meta.id
    }

    /// Current graph of the active document
    pub fn graph(&self) -> &Graph {
        &self.active.graph
    }

    /// Shared snapshot of the current graph
    pub fn snapshot(&self) -> Arc<Graph> {
        Arc::clone(&self.active.graph)
    }

    /// History of the active document
    pub fn history(&self) -> &History {
        &self.active.history
    }

    /// Metadata of every open document, active first
    pub fn documents(&self) -> impl Iterator<Item = &DocumentMeta> {
        std::iter::once(&self.active.meta).chain(self.parked.values().map(|c| &c.meta))
    }

    fn is_open(&self, id: DocumentId) -> bool {
        self.active.meta.id == id || self.parked.contains_key(&id)
    }

    fn activate(&mut self, context: DocumentContext) {
        let mut previous = std::mem::replace(&mut self.active, context);
        Self::park(&mut previous);
        self.parked.insert(previous.meta.id, previous);
    }

    /// A gesture cannot outlive its document being active
    fn park(context: &mut DocumentContext) {
        if context.history.close_transaction() {
            tracing::debug!("Closed open transaction in {:?}", context.meta.name);
        }
    }

    /// Create an empty document and make it active
    pub fn create_document(&mut self, name: impl Into<String>) -> DocumentId {
        let mut context = Self::blank_context(&self.config);
        context.meta.name = name.into();
        let id = context.meta.id;
        tracing::info!("Created document {:?}", context.meta.name);
        self.activate(context);
        id
    }

    /// Open a persisted document as a new active context.
    ///
    /// The stored graph is repaired on the way in. A document whose ID is
    /// already open gets a fresh ID.
    pub fn open_document(&mut self, document: Document) -> (DocumentId, RepairReport) {
        let Document { mut meta, graph, .. } = document;
        let (graph, report) = replace_graph_state(graph);
        self.ids.reserve_past(&graph);
        if self.is_open(meta.id) {
            meta.id = DocumentId::new();
        }
        let id = meta.id;
        tracing::info!("Opened document {:?}", meta.name);
        self.activate(DocumentContext::new(meta, graph, self.config.history_depth));
        (id, report)
    }

    /// Make another open document active
    pub fn switch_document(&mut self, id: DocumentId) -> Result<(), StoreError> {
        if self.active.meta.id == id {
            return Ok(());
        }
        let context = self
            .parked
            .shift_remove(&id)
            .ok_or(DocumentError::UnknownDocument(id))?;
        tracing::info!("Switched to document {:?}", context.meta.name);
        self.activate(context);
        Ok(())
    }

    /// Close a document, returning its final contents.
    ///
    /// Closing the active document activates the most recently parked one,
    /// or a blank document if none is left.
    pub fn close_document(&mut self, id: DocumentId) -> Result<Document, StoreError> {
        let closed = if self.active.meta.id == id {
            let replacement = match self.parked.pop() {
                Some((_, context)) => context,
                None => Self::blank_context(&self.config),
            };
            let mut closed = std::mem::replace(&mut self.active, replacement);
            Self::park(&mut closed);
            closed
        } else {
            self.parked
                .shift_remove(&id)
                .ok_or(DocumentError::UnknownDocument(id))?
        };
        tracing::info!("Closed document {:?}", closed.meta.name);
        Ok(Document::new(closed.meta, Arc::unwrap_or_clone(closed.graph)))
    }

    /// Snapshot the active document for saving
    pub fn to_document(&self) -> Document {
        Document::new(self.active.meta.clone(), (*self.active.graph).clone())
    }

    /// Clear the unsaved-changes flag after a successful save
    pub fn mark_saved(&mut self) {
        self.active.dirty = false;
    }

    /// Rename the active document
    pub fn rename_document(&mut self, name: impl Into<String>) {
        self.active.meta.name = name.into();
        self.active.meta.touch();
    }

    /// Change the active document's theme
    pub fn set_theme(&mut self, theme: Theme) {
        self.active.meta.theme = theme;
    }

    /// Change the active document's export preferences
    pub fn set_export_preferences(&mut self, export: ExportPreferences) {
        self.active.meta.export = export;
    }

    /// Install `next` as the active graph. Returns whether anything changed.
    fn commit(&mut self, kind: ChangeKind, description: &str, next: Graph) -> bool {
        if next == *self.active.graph {
            return false;
        }
        if kind == ChangeKind::Content {
            let before = Arc::clone(&self.active.graph);
            self.active.history.record(before, description);
            self.active.dirty = true;
            self.active.meta.touch();
            tracing::debug!("{description}");
        }
        self.active.graph = Arc::new(next);
        true
    }

    /// Create a node with its declared pins
    pub fn create_node(&mut self, request: &NewNode) -> NodeId {
        let (next, node_id) = ops::create_node(&self.active.graph, &mut self.ids, request);
        self.commit(ChangeKind::Content, "Create node", next);
        node_id
    }

    /// Create a node from a catalog preset
    pub fn create_node_from_preset(&mut self, preset_id: &str, position: Point) -> Result<NodeId, StoreError> {
        let (next, node_id) =
            preset::create_node_from_preset(&self.active.graph, &mut self.ids, &self.catalog, preset_id, position)?;
        self.commit(ChangeKind::Content, "Create node", next);
        Ok(node_id)
    }

    /// Delete the selected nodes and edges
    pub fn delete_selection(&mut self) -> bool {
        let next = ops::delete_selection(&self.active.graph);
        self.commit(ChangeKind::Content, "Delete selection", next)
    }

    /// Delete the selected edges only
    pub fn delete_selected_edges(&mut self) -> bool {
        let next = ops::delete_selected_edges(&self.active.graph);
        self.commit(ChangeKind::Content, "Delete edges", next)
    }

    /// Duplicate the selected nodes
    pub fn duplicate_selection(&mut self) -> bool {
        let next = ops::duplicate_selection(&self.active.graph, &mut self.ids);
        self.commit(ChangeKind::Content, "Duplicate selection", next)
    }

    /// Move the selected nodes
    pub fn move_selection_by(&mut self, dx: f64, dy: f64) -> bool {
        let next = ops::move_selection_by(&self.active.graph, dx, dy);
        self.commit(ChangeKind::Content, "Move nodes", next)
    }

    /// Move one node to an absolute position
    pub fn set_node_position(&mut self, node_id: &NodeId, position: Point) -> Result<bool, StoreError> {
        let next = ops::set_node_position(&self.active.graph, node_id, position)?;
        Ok(self.commit(ChangeKind::Content, "Move node", next))
    }

    /// Rename a node
    pub fn rename_node(&mut self, node_id: &NodeId, title: &str) -> Result<bool, StoreError> {
        let next = ops::rename_node(&self.active.graph, node_id, title)?;
        Ok(self.commit(ChangeKind::Content, &format!("Rename node to {title}"), next))
    }

    /// Change a node's display flags
    pub fn set_node_flags(&mut self, node_id: &NodeId, flags: NodeFlags) -> Result<bool, StoreError> {
        let next = ops::set_node_flags(&self.active.graph, node_id, flags)?;
        Ok(self.commit(ChangeKind::Content, "Change node style", next))
    }

    /// Record a node's measured size
    pub fn set_node_size(&mut self, node_id: &NodeId, size: Size) -> Result<bool, StoreError> {
        let next = ops::set_node_size(&self.active.graph, node_id, size)?;
        Ok(self.commit(ChangeKind::View, "Measure node", next))
    }

    /// Raise nodes to the top of the paint order
    pub fn bring_to_front(&mut self, node_ids: &[NodeId]) -> bool {
        let next = ops::bring_to_front(&self.active.graph, node_ids);
        self.commit(ChangeKind::Content, "Bring to front", next)
    }

    /// Append a pin to a node
    pub fn add_pin(&mut self, node_id: &NodeId, template: &PinTemplate) -> Result<PinId, StoreError> {
        let (next, pin_id) = ops::add_pin(&self.active.graph, &mut self.ids, node_id, template)?;
        self.commit(ChangeKind::Content, "Add pin", next);
        Ok(pin_id)
    }

    /// Remove a pin and its edges
    pub fn remove_pin(&mut self, pin_id: &PinId) -> Result<bool, StoreError> {
        let next = ops::remove_pin(&self.active.graph, pin_id)?;
        Ok(self.commit(ChangeKind::Content, "Remove pin", next))
    }

    /// Edit a pin's label, type, color or shape
    pub fn update_pin(&mut self, pin_id: &PinId, patch: &PinPatch) -> Result<bool, StoreError> {
        let next = ops::update_pin(&self.active.graph, pin_id, patch)?;
        Ok(self.commit(ChangeKind::Content, "Edit pin", next))
    }

    /// Splice a pin within its node's list
    pub fn reorder_pin(
        &mut self,
        node_id: &NodeId,
        direction: PinDirection,
        from_index: usize,
        to_index: usize,
    ) -> Result<bool, StoreError> {
        let next = ops::reorder_pin(&self.active.graph, node_id, direction, from_index, to_index)?;
        Ok(self.commit(ChangeKind::Content, "Reorder pins", next))
    }

    /// Place a pin at an index within its node's list
    pub fn move_pin_to(&mut self, pin_id: &PinId, to_index: usize) -> Result<bool, StoreError> {
        let next = ops::move_pin_to(&self.active.graph, pin_id, to_index)?;
        Ok(self.commit(ChangeKind::Content, "Reorder pins", next))
    }

    /// Connect two pins
    pub fn connect_pins(&mut self, a: &PinId, b: &PinId) -> Result<EdgeId, StoreError> {
        let (next, edge_id) = connect::connect_pins(&self.active.graph, &mut self.ids, a, b)?;
        self.commit(ChangeKind::Content, "Connect pins", next);
        Ok(edge_id)
    }

    /// Remove every edge touching a pin
    pub fn disconnect_pin(&mut self, pin_id: &PinId) -> bool {
        let next = connect::disconnect_pin(&self.active.graph, pin_id);
        self.commit(ChangeKind::Content, "Disconnect pin", next)
    }

    /// Delete one edge
    pub fn delete_edge(&mut self, edge_id: &EdgeId) -> Result<bool, StoreError> {
        let next = ops::delete_edge(&self.active.graph, edge_id)?;
        Ok(self.commit(ChangeKind::Content, "Delete edge", next))
    }

    /// Recolor an edge
    pub fn set_edge_color(&mut self, edge_id: &EdgeId, color: &str) -> Result<bool, StoreError> {
        let next = ops::set_edge_color(&self.active.graph, edge_id, color)?;
        Ok(self.commit(ChangeKind::Content, "Recolor edge", next))
    }

    /// Replace the selection
    pub fn set_selection(&mut self, nodes: &[NodeId], edges: &[EdgeId]) -> bool {
        let next = ops::set_selection(&self.active.graph, nodes, edges);
        self.commit(ChangeKind::View, "Select", next)
    }

    /// Select exactly these nodes
    pub fn select_nodes(&mut self, nodes: &[NodeId]) -> bool {
        self.set_selection(nodes, &[])
    }

    /// Toggle one node in the selection
    pub fn toggle_node_selection(&mut self, node_id: &NodeId) -> bool {
        let next = ops::toggle_node_selection(&self.active.graph, node_id);
        self.commit(ChangeKind::View, "Select", next)
    }

    /// Select every node
    pub fn select_all(&mut self) -> bool {
        let next = ops::select_all(&self.active.graph);
        self.commit(ChangeKind::View, "Select all", next)
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) -> bool {
        let next = ops::clear_selection(&self.active.graph);
        self.commit(ChangeKind::View, "Clear selection", next)
    }

    /// Replace the viewport
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        let next = ops::set_viewport(&self.active.graph, viewport);
        self.commit(ChangeKind::View, "Viewport", next)
    }

    /// Pan the viewport
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        let next = ops::pan_by(&self.active.graph, dx, dy);
        self.commit(ChangeKind::View, "Pan", next)
    }

    /// Zoom around a screen point
    pub fn zoom_at_screen_point(&mut self, cursor: Point, factor: f64) -> bool {
        let next = ops::zoom_at_screen_point(&self.active.graph, cursor, factor);
        self.commit(ChangeKind::View, "Zoom", next)
    }

    /// Kind for a policy toggle: undoable only if it had to drop edges
    fn policy_kind(&self, next: &Graph) -> ChangeKind {
        if next.edge_count() == self.active.graph.edge_count() {
            ChangeKind::View
        } else {
            ChangeKind::Content
        }
    }

    /// Toggle the single-input policy
    pub fn set_single_input_policy(&mut self, enabled: bool) -> bool {
        let next = ops::set_single_input_policy(&self.active.graph, enabled);
        let kind = self.policy_kind(&next);
        self.commit(kind, "Single input policy", next)
    }

    /// Toggle same-node connections
    pub fn set_allow_same_node_connections(&mut self, allowed: bool) -> bool {
        let next = ops::set_allow_same_node_connections(&self.active.graph, allowed);
        let kind = self.policy_kind(&next);
        self.commit(kind, "Same-node connections", next)
    }

    /// Replace the active graph wholesale (import), repairing it first
    pub fn replace_graph(&mut self, incoming: Graph) -> RepairReport {
        let (next, report) = replace_graph_state(incoming);
        self.ids.reserve_past(&next);
        self.commit(ChangeKind::Content, "Replace graph", next);
        report
    }

    /// Subgraph induced by the selected nodes
    pub fn export_selection(&self) -> Option<GraphSubset> {
        subset::build_subset_for_selection(&self.active.graph)
    }

    /// Clipboard text for the selected nodes, or `None` if nothing is selected
    pub fn copy_selection(&self) -> Result<Option<String>, StoreError> {
        let Some(subset) = self.export_selection() else {
            return Ok(None);
        };
        let count = subset.node_count();
        let text = ClipboardEnvelope::new(subset, Some(self.active_id())).encode()?;
        tracing::info!("Copied {count} nodes to clipboard");
        Ok(Some(text))
    }

    /// Insert a subset centered on `target` and select it
    pub fn paste_subset(&mut self, subset: &GraphSubset, target: Point) -> bool {
        let next = subset::merge_subset_at(&self.active.graph, &mut self.ids, subset, target);
        self.commit(ChangeKind::Content, "Paste", next)
    }

    /// Decode clipboard text and paste it centered on `target`
    pub fn paste(&mut self, text: &str, target: Point) -> Result<bool, StoreError> {
        let envelope = ClipboardEnvelope::decode(text).map_err(|e| {
            tracing::warn!("Rejected clipboard payload: {e}");
            e
        })?;
        let pasted = self.paste_subset(&envelope.subset, target);
        if pasted {
            tracing::info!("Pasted {} nodes from clipboard", envelope.subset.node_count());
        }
        Ok(pasted)
    }

    /// Open a transaction; content changes until the matching end form one undo step
    pub fn begin_transaction(&mut self, description: &str) {
        self.active.history.begin_transaction(description);
    }

    /// Close the innermost transaction
    pub fn end_transaction(&mut self) {
        if !self.active.history.end_transaction() {
            tracing::warn!("end_transaction without a matching begin");
        }
    }

    /// Undo the last content change. Returns `false` if there was none.
    pub fn undo(&mut self) -> bool {
        let current = Arc::clone(&self.active.graph);
        match self.active.history.undo(current) {
            Ok(previous) => self.restore(previous),
            Err(err) => {
                tracing::debug!("Undo skipped: {err}");
                false
            }
        }
    }

    /// Redo the last undone change. Returns `false` if there was none.
    pub fn redo(&mut self) -> bool {
        let current = Arc::clone(&self.active.graph);
        match self.active.history.redo(current) {
            Ok(next) => self.restore(next),
            Err(err) => {
                tracing::debug!("Redo skipped: {err}");
                false
            }
        }
    }

    /// Install a history snapshot, keeping the current viewport
    fn restore(&mut self, snapshot: Arc<Graph>) -> bool {
        debug_assert!(blueprint_graph::validate(&snapshot).is_empty());
        let viewport = self.active.graph.viewport();
        self.active.graph = if snapshot.viewport() == viewport {
            snapshot
        } else {
            Arc::new(ops::set_viewport(&snapshot, viewport))
        };
        self.active.dirty = true;
        self.active.meta.touch();
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.active.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.active.history.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_graph::validate;

    fn store() -> Store {
        Store::with_builtin_presets(StoreConfig::default()).unwrap()
    }

    fn node(store: &mut Store, inputs: usize, outputs: usize) -> NodeId {
        let request = NewNode::at(Point::default()).with_pins(
            (0..inputs)
                .map(|i| PinTemplate::input(format!("in{i}")))
                .chain((0..outputs).map(|i| PinTemplate::output(format!("out{i}")))),
        );
        store.create_node(&request)
    }

    fn pin(store: &Store, node: &NodeId, direction: PinDirection) -> PinId {
        store.graph().node(node).unwrap().pins(direction)[0].clone()
    }

    #[test]
    fn test_undo_restores_exact_snapshot() {
        let mut store = store();
        let a = node(&mut store, 0, 1);
        let b = node(&mut store, 1, 0);
        let out_a = pin(&store, &a, PinDirection::Output);
        let in_b = pin(&store, &b, PinDirection::Input);

        let before = store.snapshot();
        store.connect_pins(&out_a, &in_b).unwrap();
        assert!(store.undo());
        assert_eq!(*store.graph(), *before);

        let before = store.snapshot();
        store.select_nodes(&[a.clone()]);
        let selected = store.snapshot();
        store.delete_selection();
        assert!(store.undo());
        assert_eq!(*store.graph(), *selected);
        assert_ne!(*store.graph(), *before);
    }

    #[test]
    fn test_redo_reapplies() {
        let mut store = store();
        let a = node(&mut store, 0, 0);
        let after = store.snapshot();
        assert!(store.undo());
        assert!(store.graph().is_empty());
        assert!(store.redo());
        assert_eq!(*store.graph(), *after);
        assert!(store.graph().contains_node(&a));
        assert!(!store.redo());
    }

    #[test]
    fn test_view_changes_are_not_undoable() {
        let mut store = store();
        node(&mut store, 0, 0);
        let depth = store.history().undo_depth();
        store.pan_by(10.0, 10.0);
        store.zoom_at_screen_point(Point::new(5.0, 5.0), 1.2);
        store.clear_selection();
        store.set_single_input_policy(false);
        assert_eq!(store.history().undo_depth(), depth);
    }

    #[test]
    fn test_noop_mutations_do_not_record() {
        let mut store = store();
        node(&mut store, 0, 0);
        assert!(!store.move_selection_by(0.0, 0.0));
        store.clear_selection();
        assert!(!store.delete_selection());
        assert_eq!(store.history().undo_depth(), 1);
    }

    #[test]
    fn test_transaction_coalesces_drag() {
        let mut store = store();
        let a = node(&mut store, 0, 0);
        let start = store.graph().node(&a).unwrap().position;

        store.begin_transaction("Drag");
        store.move_selection_by(10.0, 0.0);
        store.move_selection_by(14.0, 0.0);
        store.end_transaction();
        assert_eq!(store.graph().node(&a).unwrap().position, start.offset(24.0, 0.0));

        assert!(store.undo());
        assert_eq!(store.graph().node(&a).unwrap().position, start);
        assert!(store.graph().contains_node(&a));
    }

    #[test]
    fn test_history_cap() {
        let mut store = store();
        for _ in 0..105 {
            node(&mut store, 0, 0);
        }
        let mut effective = 0;
        while store.undo() {
            effective += 1;
        }
        assert_eq!(effective, 100);
        assert_eq!(store.graph().node_count(), 5);
        assert!(!store.undo());
    }

    #[test]
    fn test_single_input_scenario() {
        let mut store = store();
        let a = node(&mut store, 0, 1);
        let b = node(&mut store, 1, 0);
        let out_a = pin(&store, &a, PinDirection::Output);
        let in_b = pin(&store, &b, PinDirection::Input);
        store.connect_pins(&out_a, &in_b).unwrap();
        assert_eq!(store.graph().edge_order().len(), 1);

        let c = node(&mut store, 0, 1);
        let out_c = pin(&store, &c, PinDirection::Output);
        let edge = store.connect_pins(&out_c, &in_b).unwrap();
        assert_eq!(store.graph().edge_order().len(), 1);
        assert_eq!(store.graph().edge(&edge).unwrap().from, out_c);
    }

    #[test]
    fn test_rejected_connection_leaves_state() {
        let mut store = store();
        let a = node(&mut store, 0, 1);
        let b = node(&mut store, 1, 0);
        let out_a = pin(&store, &a, PinDirection::Output);
        let in_b = pin(&store, &b, PinDirection::Input);
        store.connect_pins(&out_a, &in_b).unwrap();
        let depth = store.history().undo_depth();
        let before = store.snapshot();

        assert!(matches!(
            store.connect_pins(&out_a, &in_b),
            Err(StoreError::Connect(ConnectError::DuplicateConnection))
        ));
        assert_eq!(*store.graph(), *before);
        assert_eq!(store.history().undo_depth(), depth);
    }

    #[test]
    fn test_documents_have_separate_history() {
        let mut store = store();
        let first = store.active_id();
        node(&mut store, 0, 0);

        let second = store.create_document("Second");
        assert!(store.graph().is_empty());
        assert!(!store.can_undo());
        node(&mut store, 0, 0);
        node(&mut store, 0, 0);

        store.switch_document(first).unwrap();
        assert_eq!(store.graph().node_count(), 1);
        assert!(store.undo());
        assert!(store.graph().is_empty());

        store.switch_document(second).unwrap();
        assert_eq!(store.graph().node_count(), 2);
        assert_eq!(store.history().undo_depth(), 2);
        assert_eq!(store.documents().count(), 2);

        assert!(matches!(
            store.switch_document(DocumentId::new()),
            Err(StoreError::Document(DocumentError::UnknownDocument(_)))
        ));
    }

    #[test]
    fn test_close_document() {
        let mut store = store();
        let first = store.active_id();
        let second = store.create_document("Second");
        node(&mut store, 0, 0);

        let closed = store.close_document(second).unwrap();
        assert_eq!(closed.graph.node_count(), 1);
        assert_eq!(store.active_id(), first);

        store.close_document(first).unwrap();
        assert_eq!(store.documents().count(), 1);
        assert_ne!(store.active_id(), first);
        assert!(store.close_document(second).is_err());
    }

    #[test]
    fn test_copy_paste_round_trip() {
        let mut store = store();
        let a = node(&mut store, 0, 1);
        let b = node(&mut store, 1, 0);
        let out_a = pin(&store, &a, PinDirection::Output);
        let in_b = pin(&store, &b, PinDirection::Input);
        store.connect_pins(&out_a, &in_b).unwrap();
        store.select_nodes(&[a.clone(), b.clone()]);

        let text = store.copy_selection().unwrap().unwrap();
        let second = store.create_document("Target");
        assert!(store.paste(&text, Point::new(500.0, 500.0)).unwrap());
        assert_eq!(store.active_id(), second);
        assert_eq!(store.graph().node_count(), 2);
        assert_eq!(store.graph().edge_count(), 1);
        assert_eq!(store.graph().selected_nodes().len(), 2);
        assert!(validate(store.graph()).is_empty());

        assert!(store.undo());
        assert!(store.graph().is_empty());
    }

    #[test]
    fn test_paste_rejects_bad_payload() {
        let mut store = store();
        assert!(matches!(
            store.paste("{\"kind\":\"other\",\"version\":1}", Point::default()),
            Err(StoreError::Clipboard(ClipboardError::UnknownKind(_)))
        ));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_copy_with_empty_selection() {
        let mut store = store();
        node(&mut store, 0, 0);
        store.clear_selection();
        assert!(store.copy_selection().unwrap().is_none());
    }

    #[test]
    fn test_open_document_repairs_and_reserves_ids() {
        let mut source = store();
        let a = node(&mut source, 0, 1);
        let document = source.to_document();

        let mut store = store();
        let (id, report) = store.open_document(document);
        assert!(report.is_clean());
        assert_eq!(store.active_id(), id);
        let fresh = node(&mut store, 0, 0);
        assert_ne!(fresh, a);
        assert!(!store.graph().node(&fresh).unwrap().has_pin(&pin(&store, &a, PinDirection::Output)));
        assert!(validate(store.graph()).is_empty());
    }

    #[test]
    fn test_preset_nodes() {
        let mut store = store();
        let node_id = store.create_node_from_preset("add_float", Point::new(1.0, 1.0)).unwrap();
        assert_eq!(store.graph().node(&node_id).unwrap().title, "Add");
        assert!(matches!(
            store.create_node_from_preset("missing", Point::default()),
            Err(StoreError::Catalog(_))
        ));
    }

    #[test]
    fn test_policy_toggle_dropping_edges_is_undoable() {
        let mut store = Store::new(
            StoreConfig { single_input_policy: false, ..StoreConfig::default() },
            PresetCatalog::default(),
        );
        let a = node(&mut store, 0, 1);
        let c = node(&mut store, 0, 1);
        let b = node(&mut store, 1, 0);
        let in_b = pin(&store, &b, PinDirection::Input);
        store.connect_pins(&pin(&store, &a, PinDirection::Output), &in_b).unwrap();
        store.connect_pins(&pin(&store, &c, PinDirection::Output), &in_b).unwrap();

        assert!(store.set_single_input_policy(true));
        assert_eq!(store.graph().edge_count(), 1);
        assert!(store.undo());
        assert_eq!(store.graph().edge_count(), 2);
        assert!(!store.graph().single_input_policy());
    }

    #[test]
    fn test_transaction_does_not_follow_document_switch() {
        let mut store = store();
        let first = store.active_id();
        store.begin_transaction("Drag");
        store.create_document("Second");
        assert!(!store.history().in_transaction());
        store.end_transaction();

        store.switch_document(first).unwrap();
        assert!(!store.history().in_transaction());
        for _ in 0..3 {
            node(&mut store, 0, 0);
        }
        assert_eq!(store.history().undo_depth(), 3);
    }

    #[test]
    fn test_closing_document_closes_its_transaction() {
        let mut store = store();
        let first = store.active_id();
        let second = store.create_document("Second");
        store.begin_transaction("Drag");
        node(&mut store, 0, 0);
        let closed = store.close_document(second).unwrap();
        assert_eq!(closed.graph.node_count(), 1);
        assert_eq!(store.active_id(), first);
        assert!(!store.history().in_transaction());
    }

    #[test]
    fn test_undo_keeps_viewport() {
        let mut store = store();
        node(&mut store, 0, 0);
        store.pan_by(100.0, 0.0);
        store.zoom_at_screen_point(Point::default(), 2.0);
        let viewport = store.graph().viewport();

        assert!(store.undo());
        assert!(store.graph().is_empty());
        assert_eq!(store.graph().viewport(), viewport);
        assert_ne!(store.graph().viewport(), Viewport::default());
        assert!(store.redo());
        assert_eq!(store.graph().node_count(), 1);
        assert_eq!(store.graph().viewport(), viewport);
    }

    #[test]
    fn test_node_id_suffix_at_top_of_range() {
        let mut source = store();
        let top = source.create_node(&NewNode::default());
        let mut document = source.to_document();
        let renamed = NodeId::new(format!("node-{}", u64::MAX));
        let text = document
            .to_ron()
            .unwrap()
            .replace(&format!("\"{top}\""), &format!("\"{renamed}\""));
        document = Document::from_ron(&text).unwrap().0;
        assert!(document.graph.contains_node(&renamed));

        let mut store = store();
        store.open_document(document);
        let fresh = store.create_node(&NewNode::default());
        assert_ne!(fresh, renamed);
        assert_eq!(store.graph().node_count(), 2);
        assert!(validate(store.graph()).is_empty());
    }

    #[test]
    fn test_non_finite_moves_do_not_pollute_history() {
        let mut store = store();
        let a = node(&mut store, 0, 0);
        assert!(!store.move_selection_by(f64::NAN, 0.0));
        assert!(store.set_node_position(&a, Point::new(f64::INFINITY, 0.0)).is_err());
        store.clear_selection();
        assert!(!store.delete_selection());
        assert_eq!(store.history().undo_depth(), 1);
    }

    #[test]
    fn test_shared_handle() {
        let shared = store().into_shared();
        let node_id = shared.write().create_node(&NewNode::default());
        assert!(shared.read().graph().contains_node(&node_id));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut store = store();
        assert!(!store.active().is_dirty());
        node(&mut store, 0, 0);
        assert!(store.active().is_dirty());
        store.mark_saved();
        store.pan_by(1.0, 0.0);
        assert!(!store.active().is_dirty());
    }
}
