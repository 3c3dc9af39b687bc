//! Treatment tagging state machine.
//!
//! Tracks which treatment is armed for the next freehand stroke and which
//! tagged stroke is selected for editing. All transitions go through
//! `TaggingMachine::handle`, which returns the side effects the controller
//! must apply to the drawing surface and panels. A failed event leaves the
//! machine untouched.

use treatmark_canvas::{PointerDown, ToolKind};

use super::staging::StagingMap;
use crate::error::Result;
use crate::model::{TreatmentCatalog, TreatmentTag};

/// Authoring state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaggingState {
    /// No treatment armed, no stroke selected
    #[default]
    Idle,
    /// The next freehand stroke is tagged with `treatment`
    Armed { treatment: String },
    /// A tagged stroke is selected; its values are live-editable
    Editing { element: String, treatment: String },
}

impl TaggingState {
    /// Treatment whose panel is open, if any.
    pub fn treatment(&self) -> Option<&str> {
        match self {
            TaggingState::Idle => None,
            TaggingState::Armed { treatment } | TaggingState::Editing { treatment, .. } => {
                Some(treatment)
            }
        }
    }

    /// Selected stroke, if any.
    pub fn selected_element(&self) -> Option<&str> {
        match self {
            TaggingState::Editing { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TaggingState::Idle)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggingEvent {
    /// A treatment was picked in the treatment panel
    TreatmentPicked(String),
    /// The whiteboard's active tool changed
    ToolChanged(ToolKind),
    /// A freehand stroke was completed (pointer released)
    StrokeFinished { element: String },
    /// The pointer went down on the canvas
    PointerDown(PointerDown),
    /// A variable field in the treatment panel was edited
    VariableEdited { name: String, value: String },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Switch to the freehand tool with the given stroke color
    ActivateFreedraw { color: String },
    /// Open the variable panel of a treatment
    OpenTreatmentPanel { treatment: String },
    /// Re-open the background template panel
    ShowTemplatePanel,
    /// Replace an element's custom data with a tag
    TagElement { element: String, tag: TreatmentTag },
}

/// The tagging state plus its staging buffer.
#[derive(Debug, Clone, Default)]
pub struct TaggingMachine {
    state: TaggingState,
    staging: StagingMap,
}

impl TaggingMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TaggingState {
        &self.state
    }

    pub fn staging(&self) -> &StagingMap {
        &self.staging
    }

    /// Reset the staging buffer for a newly loaded catalog.
    pub fn reset_staging(&mut self, catalog: &TreatmentCatalog) {
        self.staging = StagingMap::from_catalog(catalog);
    }

    /// Drop a selection whose element is gone after the whole scene was
    /// replaced. An armed treatment stays armed.
    pub fn scene_replaced(&mut self) {
        if let TaggingState::Editing { treatment, .. } = &self.state {
            log::debug!("Selection dropped with the scene ({})", treatment);
            self.state = TaggingState::Idle;
        }
    }

    /// Apply one event and return the effects to carry out.
    pub fn handle(
        &mut self,
        event: TaggingEvent,
        catalog: &TreatmentCatalog,
    ) -> Result<Vec<Effect>> {
        match event {
            TaggingEvent::TreatmentPicked(treatment_id) => {
                let treatment = catalog.require(&treatment_id)?;
                log::debug!("🩹 Armed treatment {}", treatment.id);
                let effects = vec![
                    Effect::ActivateFreedraw {
                        color: treatment.color.hex().to_string(),
                    },
                    Effect::OpenTreatmentPanel {
                        treatment: treatment.id.clone(),
                    },
                ];
                self.state = TaggingState::Armed {
                    treatment: treatment.id.clone(),
                };
                Ok(effects)
            }

            TaggingEvent::ToolChanged(tool) => match &self.state {
                TaggingState::Armed { treatment } if !tool.keeps_treatment_armed() => {
                    log::debug!("Tool {} disarms {}", tool.as_str(), treatment);
                    self.state = TaggingState::Idle;
                    Ok(vec![Effect::ShowTemplatePanel])
                }
                _ => Ok(Vec::new()),
            },

            TaggingEvent::StrokeFinished { element } => {
                let Some(treatment) = self.state.treatment().map(str::to_string) else {
                    log::trace!("Stroke {} finished with no treatment armed", element);
                    return Ok(Vec::new());
                };
                catalog.require(&treatment)?;
                let tag = TreatmentTag::new(treatment.clone(), self.staging.snapshot(&treatment));
                log::debug!("🏷️ Tagged stroke {} with {}", element, treatment);
                self.state = TaggingState::Armed { treatment };
                Ok(vec![Effect::TagElement { element, tag }])
            }

            TaggingEvent::PointerDown(PointerDown { hit, tool }) => match hit {
                Some(element) if element.is_freedraw() => {
                    let Some(tag) = element
                        .custom_data
                        .as_ref()
                        .and_then(TreatmentTag::from_custom_data)
                    else {
                        log::trace!("Ignoring untagged stroke {}", element.id);
                        return Ok(Vec::new());
                    };
                    catalog.require(&tag.treatment_id)?;
                    log::debug!("✏️ Editing stroke {} ({})", element.id, tag.treatment_id);
                    self.staging.replace(&tag.treatment_id, tag.variable_values);
                    self.state = TaggingState::Editing {
                        element: element.id,
                        treatment: tag.treatment_id.clone(),
                    };
                    Ok(vec![Effect::OpenTreatmentPanel {
                        treatment: tag.treatment_id,
                    }])
                }
                _ if tool == ToolKind::Selection => {
                    if !self.state.is_idle() {
                        log::debug!("Selection cleared");
                    }
                    self.state = TaggingState::Idle;
                    Ok(Vec::new())
                }
                _ => Ok(Vec::new()),
            },

            TaggingEvent::VariableEdited { name, value } => {
                let Some(treatment_id) = self.state.treatment().map(str::to_string) else {
                    log::debug!("Variable '{}' edited with no treatment open", name);
                    return Ok(Vec::new());
                };
                catalog.require(&treatment_id)?.validate(&name, &value)?;
                self.staging.set(&treatment_id, &name, &value);

                match &self.state {
                    TaggingState::Editing { element, .. } => Ok(vec![Effect::TagElement {
                        element: element.clone(),
                        tag: TreatmentTag::new(
                            treatment_id.clone(),
                            self.staging.snapshot(&treatment_id),
                        ),
                    }]),
                    _ => Ok(Vec::new()),
                }
            }
        }
    }
}
