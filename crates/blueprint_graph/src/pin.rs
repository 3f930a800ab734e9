// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag given to pins created without one
pub const DEFAULT_PIN_TYPE: &str = "any";
/// Color given to pins created without one
pub const DEFAULT_PIN_COLOR: &str = "#a0a4ab";

/// Unique identifier for a pin
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub String);

impl PinId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    /// Input pin, the destination end of an edge
    Input,
    /// Output pin, the source end of an edge
    Output,
}

impl PinDirection {
    /// The other direction
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Glyph drawn for a pin.
///
/// Shapes are a compatibility hint for the canvas; connection rules never
/// look at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinShape {
    /// Round data pin
    #[default]
    Circle,
    /// Diamond, usually wildcard types
    Diamond,
    /// Square, usually containers
    Square,
    /// Triangle, usually execution flow
    Triangle,
}

/// A pin on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    /// Unique pin ID
    pub id: PinId,
    /// Owning node, fixed at creation
    pub node: NodeId,
    /// Direction, fixed at creation
    pub direction: PinDirection,
    /// Display label
    pub label: String,
    /// Declared type tag (free-form)
    pub type_tag: String,
    /// Color tag
    pub color: String,
    /// Shape tag
    #[serde(default)]
    pub shape: PinShape,
}

impl Pin {
    /// Build a pin owned by `node` from a template
    pub fn from_template(id: PinId, node: NodeId, template: &PinTemplate) -> Self {
        Self {
            id,
            node,
            direction: template.direction,
            label: template.label.clone(),
            type_tag: template.type_tag.clone(),
            color: template.color.clone(),
            shape: template.shape,
        }
    }

    /// Whether this pin is an input
    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    /// Whether this pin is an output
    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    /// Template describing this pin, without its identity
    pub fn to_template(&self) -> PinTemplate {
        PinTemplate {
            label: self.label.clone(),
            direction: self.direction,
            type_tag: self.type_tag.clone(),
            color: self.color.clone(),
            shape: self.shape,
        }
    }
}

/// Declaration of a pin to create, without identity or owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinTemplate {
    /// Display label
    pub label: String,
    /// Direction
    pub direction: PinDirection,
    /// Declared type tag
    #[serde(default = "default_type_tag")]
    pub type_tag: String,
    /// Color tag
    #[serde(default = "default_color")]
    pub color: String,
    /// Shape tag
    #[serde(default)]
    pub shape: PinShape,
}

fn default_type_tag() -> String {
    DEFAULT_PIN_TYPE.to_string()
}

fn default_color() -> String {
    DEFAULT_PIN_COLOR.to_string()
}

impl PinTemplate {
    /// Create a new pin template
    pub fn new(label: impl Into<String>, direction: PinDirection) -> Self {
        Self {
            label: label.into(),
            direction,
            type_tag: default_type_tag(),
            color: default_color(),
            shape: PinShape::Circle,
        }
    }

    /// Create a new input pin template
    pub fn input(label: impl Into<String>) -> Self {
        Self::new(label, PinDirection::Input)
    }

    /// Create a new output pin template
    pub fn output(label: impl Into<String>) -> Self {
        Self::new(label, PinDirection::Output)
    }

    /// Set the type tag
    pub fn typed(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = type_tag.into();
        self
    }

    /// Set the color tag
    pub fn colored(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the shape
    pub fn shaped(mut self, shape: PinShape) -> Self {
        self.shape = shape;
        self
    }
}

/// Partial update of a pin's mutable attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinPatch {
    /// New label
    pub label: Option<String>,
    /// New type tag
    pub type_tag: Option<String>,
    /// New color tag
    pub color: Option<String>,
    /// New shape
    pub shape: Option<PinShape>,
}

impl PinPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.type_tag.is_none() && self.color.is_none() && self.shape.is_none()
    }

    pub(crate) fn apply(&self, pin: &mut Pin) {
        if let Some(label) = &self.label {
            pin.label.clone_from(label);
        }
        if let Some(type_tag) = &self.type_tag {
            pin.type_tag.clone_from(type_tag);
        }
        if let Some(color) = &self.color {
            pin.color.clone_from(color);
        }
        if let Some(shape) = self.shape {
            pin.shape = shape;
        }
    }
}
