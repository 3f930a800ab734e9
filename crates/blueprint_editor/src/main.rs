// SPDX-License-Identifier: MIT OR Apache-2.0
//! `blueprint` - load blueprint documents and report on them.
//!
//! Each path on the command line is opened as a document in a fresh store.
//! Graphs that needed repairs on the way in are reported.

use blueprint_editor::{logging, Document, Store, StoreConfig};
use std::path::Path;

fn open(store: &mut Store, path: &Path) -> Result<(), blueprint_editor::StoreError> {
    let (document, _) = Document::load(path)?;
    let (_, report) = store.open_document(document);
    if !report.is_clean() {
        tracing::warn!("{}: repaired on load: {:?}", path.display(), report);
    }
    let graph = store.graph();
    tracing::info!(
        "{}: {:?} has {} nodes, {} pins, {} edges",
        path.display(),
        store.active().meta().name,
        graph.node_count(),
        graph.pin_count(),
        graph.edge_count()
    );
    Ok(())
}

fn main() {
    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {e}");
    }
    tracing::info!("Starting blueprint v{}", env!("CARGO_PKG_VERSION"));

    let mut store = match Store::with_builtin_presets(StoreConfig::from_env()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to create store: {e}");
            std::process::exit(1);
        }
    };

    let mut failed = false;
    for arg in std::env::args_os().skip(1) {
        let path = Path::new(&arg);
        if let Err(e) = open(&mut store, path) {
            tracing::error!("{}: {e}", path.display());
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}
