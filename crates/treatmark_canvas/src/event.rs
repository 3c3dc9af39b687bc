use serde::{Deserialize, Serialize};

use crate::scene::DrawingElement;
use crate::tool::{PointerButton, ToolKind};

/// Notification sent by the whiteboard after every scene mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneChange {
    /// Element currently being drawn, if any
    #[serde(default)]
    pub editing_element: Option<DrawingElement>,
    /// Primary pointer button state at the time of the change
    #[serde(default)]
    pub cursor_button: PointerButton,
    /// Tool active at the time of the change
    #[serde(default)]
    pub active_tool: ToolKind,
}

impl SceneChange {
    /// A change reported while a stroke is still being drawn.
    pub fn drawing(element: DrawingElement) -> Self {
        Self {
            editing_element: Some(element),
            cursor_button: PointerButton::Down,
            active_tool: ToolKind::Freedraw,
        }
    }

    /// A change reported after the pointer was released.
    pub fn released(active_tool: ToolKind) -> Self {
        Self {
            editing_element: None,
            cursor_button: PointerButton::Up,
            active_tool,
        }
    }
}

/// Notification sent when the pointer is pressed on the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerDown {
    /// Hit-tested element under the pointer
    #[serde(default)]
    pub hit: Option<DrawingElement>,
    /// Tool active when the pointer went down
    #[serde(default)]
    pub tool: ToolKind,
}

impl PointerDown {
    /// Pointer pressed on an element.
    pub fn on(element: DrawingElement, tool: ToolKind) -> Self {
        Self {
            hit: Some(element),
            tool,
        }
    }

    /// Pointer pressed on empty canvas.
    pub fn empty(tool: ToolKind) -> Self {
        Self { hit: None, tool }
    }
}
