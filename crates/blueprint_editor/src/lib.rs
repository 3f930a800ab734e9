// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint editor core.
//!
//! Everything between the graph model and a user interface:
//! - Snapshot-based undo/redo with transactions
//! - A store holding several open documents, each with its own history
//! - Clipboard envelopes for copy/paste between documents
//! - RON document files and editor configuration
//!
//! ## Architecture
//!
//! The [`store::Store`] is the only mutable state. It applies the pure
//! mutations from [`blueprint_graph`] to the active document and swaps in
//! the result. Content changes push the previous snapshot onto that
//! document's [`history::History`]; selection and viewport changes do not.

pub mod clipboard;
pub mod config;
pub mod document;
pub mod history;
pub mod logging;
pub mod store;

pub use clipboard::{ClipboardEnvelope, ClipboardError};
pub use config::{ConfigError, StoreConfig};
pub use document::{Document, DocumentError, DocumentId, DocumentMeta, ExportPreferences, Theme};
pub use history::{History, HistoryError, HistoryStats, OperationID};
pub use store::{ChangeKind, DocumentContext, SharedStore, Store, StoreError};
