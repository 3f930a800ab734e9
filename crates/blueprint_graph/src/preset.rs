// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node presets: immutable pin-list templates the palette offers.

use crate::geometry::Point;
use crate::graph::Graph;
use crate::ids::IdAllocator;
use crate::node::NodeId;
use crate::ops::{create_node, NewNode};
use crate::pin::{PinShape, PinTemplate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node template from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Unique preset identifier
    pub id: String,
    /// Title given to created nodes
    pub title: String,
    /// Palette category
    pub category: String,
    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Pins, in creation order
    pub pins: Vec<PinTemplate>,
}

impl Preset {
    /// Node creation request for this preset at `position`
    pub fn request_at(&self, position: Point) -> NewNode {
        NewNode::at(position)
            .titled(self.title.clone())
            .with_pins(self.pins.iter().cloned())
    }

    /// Whether the preset carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Catalog errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two presets share an ID
    #[error("Duplicate preset id: {0}")]
    DuplicatePresetId(String),

    /// No preset with this ID
    #[error("Preset not found: {0}")]
    PresetNotFound(String),
}

/// Registry of presets keyed by ID
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    presets: IndexMap<String, Preset>,
}

impl PresetCatalog {
    /// Build a catalog, refusing duplicate IDs
    pub fn new(presets: impl IntoIterator<Item = Preset>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for preset in presets {
            if catalog.presets.contains_key(&preset.id) {
                return Err(CatalogError::DuplicatePresetId(preset.id));
            }
            catalog.presets.insert(preset.id.clone(), preset);
        }
        Ok(catalog)
    }

    /// Get a preset by ID
    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }

    /// All presets in registration order
    pub fn presets(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    /// Presets in one category
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Preset> {
        self.presets.values().filter(move |p| p.category == category)
    }

    /// Presets whose title or tags match `query`, case-insensitively
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Preset> {
        let needle = query.to_lowercase();
        self.presets.values().filter(move |p| {
            p.title.to_lowercase().contains(&needle) || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Create a node from a catalog preset
pub fn create_node_from_preset(
    graph: &Graph,
    ids: &mut IdAllocator,
    catalog: &PresetCatalog,
    preset_id: &str,
    position: Point,
) -> Result<(Graph, NodeId), CatalogError> {
    let preset = catalog
        .get(preset_id)
        .ok_or_else(|| CatalogError::PresetNotFound(preset_id.to_string()))?;
    Ok(create_node(graph, ids, &preset.request_at(position)))
}

const EXEC_COLOR: &str = "#e8e8e8";
const FLOAT_COLOR: &str = "#8fd18f";
const BOOL_COLOR: &str = "#d05050";
const STRING_COLOR: &str = "#e07ad8";

fn exec_in() -> PinTemplate {
    PinTemplate::input("").typed("exec").colored(EXEC_COLOR).shaped(PinShape::Triangle)
}

fn exec_out(label: &str) -> PinTemplate {
    PinTemplate::output(label).typed("exec").colored(EXEC_COLOR).shaped(PinShape::Triangle)
}

fn float_in(label: &str) -> PinTemplate {
    PinTemplate::input(label).typed("float").colored(FLOAT_COLOR)
}

fn preset(id: &str, title: &str, category: &str, tags: &[&str], pins: Vec<PinTemplate>) -> Preset {
    Preset {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        pins,
    }
}

/// The presets shipped with the editor
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        preset("event_begin", "Event Begin", "Events", &["event", "start"], vec![exec_out("")]),
        preset(
            "event_tick",
            "Event Tick",
            "Events",
            &["event", "update", "frame"],
            vec![exec_out(""), PinTemplate::output("Delta").typed("float").colored(FLOAT_COLOR)],
        ),
        preset(
            "branch",
            "Branch",
            "Flow",
            &["if", "condition"],
            vec![
                exec_in(),
                PinTemplate::input("Condition").typed("bool").colored(BOOL_COLOR),
                exec_out("True"),
                exec_out("False"),
            ],
        ),
        preset(
            "sequence",
            "Sequence",
            "Flow",
            &["order"],
            vec![exec_in(), exec_out("Then 0"), exec_out("Then 1")],
        ),
        preset(
            "add_float",
            "Add",
            "Math",
            &["plus", "sum", "float"],
            vec![
                float_in("A"),
                float_in("B"),
                PinTemplate::output("Result").typed("float").colored(FLOAT_COLOR),
            ],
        ),
        preset(
            "compare_float",
            "Greater Than",
            "Math",
            &["compare", ">", "float"],
            vec![
                float_in("A"),
                float_in("B"),
                PinTemplate::output("Result").typed("bool").colored(BOOL_COLOR),
            ],
        ),
        preset(
            "make_array",
            "Make Array",
            "Utility",
            &["array", "list"],
            vec![
                PinTemplate::input("[0]").typed("any").shaped(PinShape::Diamond),
                PinTemplate::output("Array").typed("array").shaped(PinShape::Square),
            ],
        ),
        preset(
            "print_string",
            "Print String",
            "Debug",
            &["log", "print", "debug"],
            vec![
                exec_in(),
                PinTemplate::input("Text").typed("string").colored(STRING_COLOR),
                exec_out(""),
            ],
        ),
    ]
}

/// Catalog of [`builtin_presets`]
pub fn builtin_catalog() -> Result<PresetCatalog, CatalogError> {
    PresetCatalog::new(builtin_presets())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::PinDirection;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.len(), builtin_presets().len());
        assert_eq!(catalog.in_category("Math").count(), 2);
        assert!(catalog.get("branch").is_some());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut presets = builtin_presets();
        presets.push(presets[0].clone());
        assert_eq!(
            PresetCatalog::new(presets).unwrap_err(),
            CatalogError::DuplicatePresetId("event_begin".to_string())
        );
    }

    #[test]
    fn test_search() {
        let catalog = builtin_catalog().unwrap();
        let hits: Vec<&str> = catalog.search("PRINT").map(|p| p.id.as_str()).collect();
        assert_eq!(hits, vec!["print_string"]);
        assert!(catalog.get("sequence").unwrap().has_tag("Order"));
    }

    #[test]
    fn test_create_node_from_preset() {
        let catalog = builtin_catalog().unwrap();
        let mut ids = IdAllocator::new();
        let (graph, node_id) =
            create_node_from_preset(&Graph::new(), &mut ids, &catalog, "branch", Point::new(5.0, 5.0)).unwrap();
        let node = graph.node(&node_id).unwrap();
        assert_eq!(node.title, "Branch");
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.outputs.len(), 2);
        let labels: Vec<&str> = graph
            .node_pins(&node_id, PinDirection::Output)
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["True", "False"]);

        assert_eq!(
            create_node_from_preset(&graph, &mut ids, &catalog, "nope", Point::default()).unwrap_err(),
            CatalogError::PresetNotFound("nope".to_string())
        );
    }
}
