//! Application message types.
//!
//! All page events are represented as messages in the Elm architecture
//! style. `Annotator::update` handles them synchronously and returns a
//! `Command` for work that needs the network.

use treatmark_canvas::{PointerDown, SceneChange};

use crate::keybindings::KeyPress;
use crate::model::TemplateCategory;

/// Whiteboard notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasMessage {
    /// The scene or app state changed
    SceneChanged(SceneChange),
    /// The pointer went down on the canvas
    PointerDown(PointerDown),
}

/// Treatment panel events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreatmentMessage {
    /// A treatment button was clicked
    Picked(String),
    /// A variable field changed
    VariableEdited { name: String, value: String },
}

/// Panel visibility events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMessage {
    ToggleTemplates,
    ToggleTreatments,
    OpenHistory,
    CloseHistory,
    /// A template category tab was selected
    SelectCategory(TemplateCategory),
}

/// Messages that can be sent to update application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Canvas(CanvasMessage),
    Treatment(TreatmentMessage),
    Panel(PanelMessage),
    /// A background template was clicked
    TemplateSelected {
        category: TemplateCategory,
        index: usize,
    },
    /// A history entry was clicked
    HistorySelected(usize),
    /// A key was pressed anywhere on the page
    KeyDown(KeyPress),
    /// The save button was clicked
    SaveRequested,
    /// Re-run the treatments/templates fetch
    RetryReferenceData,
    /// Re-run the history fetch
    RetryHistory,
}

/// Asynchronous work requested by `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    None,
    /// Persist the drawing
    Save,
    /// Load and place a background template
    PlaceTemplate {
        category: TemplateCategory,
        index: usize,
    },
    LoadReferenceData,
    LoadHistory,
}

impl Command {
    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }
}
