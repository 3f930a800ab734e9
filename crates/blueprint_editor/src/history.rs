// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history built on whole-graph snapshots.
//!
//! Graphs are immutable values shared through `Arc`, so a snapshot costs
//! a reference count bump and prior states are never touched in place.
//! Each document context owns one [`History`].

use crate::document::unix_now;
use blueprint_graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Unique operation ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationID(u64);

impl OperationID {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// One undo step: the graph as it was before the step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Operation ID
    pub id: OperationID,
    /// Human-readable description
    pub description: String,
    /// Graph to restore
    pub snapshot: Arc<Graph>,
    /// Timestamp (seconds since the Unix epoch)
    pub timestamp: u64,
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
    /// Whether a transaction is open
    pub in_transaction: bool,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    /// Undo stack, oldest first
    undo_stack: VecDeque<HistoryEntry>,
    /// Redo stack, oldest first
    redo_stack: VecDeque<HistoryEntry>,
    /// Next operation ID
    next_id: u64,
    /// Maximum history depth
    max_depth: usize,
    /// Open transaction nesting
    transaction_depth: usize,
    /// Description of the outermost open transaction
    transaction_label: Option<String>,
    /// Whether the open transaction has already pushed its entry
    transaction_recorded: bool,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth,
            transaction_depth: 0,
            transaction_label: None,
            transaction_recorded: false,
        }
    }

    fn entry(&mut self, description: String, snapshot: Arc<Graph>) -> HistoryEntry {
        let id = OperationID(self.next_id);
        self.next_id += 1;
        HistoryEntry {
            id,
            description,
            snapshot,
            timestamp: unix_now(),
        }
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        // Oldest history goes first once the cap is reached
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Record the state preceding a content change.
    ///
    /// Inside a transaction only the first change records; later ones are
    /// absorbed into that entry and `None` is returned.
    pub fn record(&mut self, before: Arc<Graph>, description: &str) -> Option<OperationID> {
        if self.transaction_depth > 0 {
            if self.transaction_recorded {
                return None;
            }
            self.transaction_recorded = true;
        }
        let description = self
            .transaction_label
            .clone()
            .unwrap_or_else(|| description.to_string());
        let entry = self.entry(description, before);
        let id = entry.id;
        self.redo_stack.clear();
        self.push_undo(entry);
        Some(id)
    }

    /// Open a transaction. Nested calls join the outermost one.
    pub fn begin_transaction(&mut self, description: &str) {
        if self.transaction_depth == 0 {
            self.transaction_label = Some(description.to_string());
            self.transaction_recorded = false;
        }
        self.transaction_depth += 1;
    }

    /// Close a transaction. Returns `false` if none was open.
    pub fn end_transaction(&mut self) -> bool {
        if self.transaction_depth == 0 {
            return false;
        }
        self.transaction_depth -= 1;
        if self.transaction_depth == 0 {
            self.reset_transaction();
        }
        true
    }

    /// Close any open transaction regardless of nesting. Returns whether one was open.
    pub fn close_transaction(&mut self) -> bool {
        let was_open = self.in_transaction();
        self.reset_transaction();
        was_open
    }

    fn reset_transaction(&mut self) {
        self.transaction_depth = 0;
        self.transaction_label = None;
        self.transaction_recorded = false;
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    /// Step back: returns the graph to restore. `current` moves to the redo stack.
    ///
    /// Any open transaction is closed first.
    pub fn undo(&mut self, current: Arc<Graph>) -> Result<Arc<Graph>> {
        self.reset_transaction();
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;
        self.redo_stack.push_back(HistoryEntry {
            id: entry.id,
            description: entry.description.clone(),
            snapshot: current,
            timestamp: entry.timestamp,
        });
        Ok(entry.snapshot)
    }

    /// Step forward again: returns the graph to restore. `current` moves to the undo stack.
    pub fn redo(&mut self, current: Arc<Graph>) -> Result<Arc<Graph>> {
        self.reset_transaction();
        let entry = self
            .redo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToRedo)?;
        self.push_undo(HistoryEntry {
            id: entry.id,
            description: entry.description.clone(),
            snapshot: current,
            timestamp: entry.timestamp,
        });
        Ok(entry.snapshot)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.reset_transaction();
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_depth: self.max_depth,
            in_transaction: self.in_transaction(),
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_graph::geometry::Viewport;
    use blueprint_graph::ops::set_viewport;

    /// Distinct graphs, told apart by their pan
    fn graph(n: u32) -> Arc<Graph> {
        Arc::new(set_viewport(&Graph::new(), Viewport::new(f64::from(n), 0.0, 1.0)))
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        history.record(graph(0), "Create node");
        let restored = history.undo(graph(1)).unwrap();
        assert_eq!(*restored, *graph(0));
        assert!(history.can_redo());
        assert_eq!(history.redo_description(), Some("Create node"));

        let again = history.redo(restored).unwrap();
        assert_eq!(*again, *graph(1));
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = History::new();
        assert_eq!(history.undo(graph(0)).unwrap_err(), HistoryError::NothingToUndo);
        assert_eq!(history.redo(graph(0)).unwrap_err(), HistoryError::NothingToRedo);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(graph(0), "a");
        history.undo(graph(1)).unwrap();
        history.record(graph(0), "b");
        assert!(!history.can_redo());
        assert_eq!(history.undo_description(), Some("b"));
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = History::with_max_depth(3);
        for n in 0..5 {
            history.record(graph(n), "step");
        }
        assert_eq!(history.undo_depth(), 3);
        let mut current = graph(5);
        for _ in 0..3 {
            current = history.undo(current).unwrap();
        }
        assert_eq!(*current, *graph(2));
        assert!(history.undo(current).is_err());
    }

    #[test]
    fn test_transaction_coalesces() {
        let mut history = History::new();
        history.begin_transaction("Move nodes");
        assert!(history.record(graph(0), "Move").is_some());
        assert!(history.record(graph(1), "Move").is_none());
        history.begin_transaction("Nested");
        assert!(history.record(graph(2), "Move").is_none());
        assert!(history.end_transaction());
        assert!(history.in_transaction());
        assert!(history.end_transaction());
        assert!(!history.end_transaction());

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.undo_description(), Some("Move nodes"));
        assert_eq!(*history.undo(graph(3)).unwrap(), *graph(0));
    }

    #[test]
    fn test_close_transaction() {
        let mut history = History::new();
        assert!(!history.close_transaction());
        history.begin_transaction("outer");
        history.begin_transaction("inner");
        history.record(graph(0), "a");
        assert!(history.close_transaction());
        assert!(!history.in_transaction());
        history.record(graph(1), "b");
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.undo_description(), Some("b"));
    }

    #[test]
    fn test_undo_closes_transaction() {
        let mut history = History::new();
        history.record(graph(0), "a");
        history.begin_transaction("drag");
        history.undo(graph(1)).unwrap();
        assert!(!history.in_transaction());
        assert!(history.stats() == HistoryStats { undo_count: 0, redo_count: 1, max_depth: MAX_HISTORY, in_transaction: false });
    }
}
