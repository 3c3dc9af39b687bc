//! Message handlers for the annotation controller.
//!
//! Each handler processes a specific category of messages,
//! keeping `Annotator::update` clean and organized.

use treatmark_canvas::{DrawingSurface, PointerButton, SceneChange, ToolKind};

use crate::error::Result;
use crate::keybindings::{KeyAction, KeyBindings, KeyPress};
use crate::message::{Command, PanelMessage};
use crate::state::{Effect, PanelState};

/// Handle panel visibility messages.
pub fn handle_panel(msg: PanelMessage, panels: &mut PanelState) {
    match msg {
        PanelMessage::ToggleTemplates => panels.toggle_templates(),
        PanelMessage::ToggleTreatments => panels.toggle_treatments(),
        PanelMessage::OpenHistory => panels.set_history_open(true),
        PanelMessage::CloseHistory => panels.set_history_open(false),
        PanelMessage::SelectCategory(category) => {
            log::debug!("🔄 Template tab: {}", category);
            panels.category_tab = category;
        }
    }
}

/// Handle a page key press.
///
/// A non-empty command means the key was bound and its default behavior
/// must be suppressed.
pub fn handle_key(press: &KeyPress, bindings: &KeyBindings) -> Command {
    match bindings.action_for(press) {
        Some(KeyAction::Save) => {
            log::debug!("⌨️ Save shortcut");
            Command::Save
        }
        None => Command::None,
    }
}

/// Detect stroke completion from the change stream.
///
/// A change carrying an in-progress freehand element records it as pending;
/// a later change with the pointer released returns the pending id.
pub fn track_stroke(change: &SceneChange, pending: &mut Option<String>) -> Option<String> {
    let previous = pending.clone();

    if let Some(element) = change
        .editing_element
        .as_ref()
        .filter(|element| element.is_freedraw())
    {
        *pending = Some(element.id.clone());
    }

    match previous {
        Some(id) if change.cursor_button == PointerButton::Up => {
            *pending = None;
            Some(id)
        }
        _ => None,
    }
}

/// Carry out the side effects of a tagging transition.
pub fn apply_effects(
    effects: Vec<Effect>,
    surface: &mut dyn DrawingSurface,
    panels: &mut PanelState,
) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::ActivateFreedraw { color } => {
                surface.set_active_tool(ToolKind::Freedraw);
                surface.set_stroke_color(&color);
            }
            Effect::OpenTreatmentPanel { treatment } => {
                log::trace!("Treatment panel: {}", treatment);
                panels.show_treatments();
            }
            Effect::ShowTemplatePanel => panels.show_templates(),
            Effect::TagElement { element, tag } => {
                surface.set_custom_data(&element, tag.to_custom_data())?;
            }
        }
    }
    Ok(())
}
