//! Tool and element kinds as the whiteboard names them.
//!
//! Both enums serialize to the whiteboard's lowercase string identifiers.
//! Kinds this crate has no special handling for are preserved verbatim
//! through `Other`, so scenes round-trip without loss.

use serde::{Deserialize, Serialize};

/// The active drawing tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolKind {
    /// Generic selection / pointer tool
    #[default]
    Selection,
    /// Freehand pen
    Freedraw,
    Rectangle,
    Ellipse,
    Diamond,
    Arrow,
    Line,
    Text,
    Image,
    Eraser,
    Hand,
    /// Any tool this crate does not model explicitly
    Other(String),
}

impl ToolKind {
    /// Whiteboard identifier for this tool.
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Selection => "selection",
            ToolKind::Freedraw => "freedraw",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Diamond => "diamond",
            ToolKind::Arrow => "arrow",
            ToolKind::Line => "line",
            ToolKind::Text => "text",
            ToolKind::Image => "image",
            ToolKind::Eraser => "eraser",
            ToolKind::Hand => "hand",
            ToolKind::Other(name) => name,
        }
    }

    /// Freehand and selection keep a treatment armed; every other tool
    /// signals that the user left drawing mode.
    pub fn keeps_treatment_armed(&self) -> bool {
        matches!(self, ToolKind::Freedraw | ToolKind::Selection)
    }
}

impl From<String> for ToolKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "selection" => ToolKind::Selection,
            "freedraw" => ToolKind::Freedraw,
            "rectangle" => ToolKind::Rectangle,
            "ellipse" => ToolKind::Ellipse,
            "diamond" => ToolKind::Diamond,
            "arrow" => ToolKind::Arrow,
            "line" => ToolKind::Line,
            "text" => ToolKind::Text,
            "image" => ToolKind::Image,
            "eraser" => ToolKind::Eraser,
            "hand" => ToolKind::Hand,
            _ => ToolKind::Other(value),
        }
    }
}

impl From<ToolKind> for String {
    fn from(value: ToolKind) -> Self {
        match value {
            ToolKind::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// The `type` of a scene element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Freedraw,
    Image,
    Rectangle,
    Ellipse,
    Diamond,
    Arrow,
    Line,
    Text,
    Frame,
    Other(String),
}

impl ElementType {
    /// Whiteboard identifier for this element type.
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Freedraw => "freedraw",
            ElementType::Image => "image",
            ElementType::Rectangle => "rectangle",
            ElementType::Ellipse => "ellipse",
            ElementType::Diamond => "diamond",
            ElementType::Arrow => "arrow",
            ElementType::Line => "line",
            ElementType::Text => "text",
            ElementType::Frame => "frame",
            ElementType::Other(name) => name,
        }
    }
}

impl From<String> for ElementType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "freedraw" => ElementType::Freedraw,
            "image" => ElementType::Image,
            "rectangle" => ElementType::Rectangle,
            "ellipse" => ElementType::Ellipse,
            "diamond" => ElementType::Diamond,
            "arrow" => ElementType::Arrow,
            "line" => ElementType::Line,
            "text" => ElementType::Text,
            "frame" => ElementType::Frame,
            _ => ElementType::Other(value),
        }
    }
}

impl From<ElementType> for String {
    fn from(value: ElementType) -> Self {
        match value {
            ElementType::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// State of the primary pointer button as reported with scene changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Up,
    Down,
}
