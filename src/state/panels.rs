//! Side panel visibility.

use crate::model::TemplateCategory;

/// Which side panels are open.
///
/// The template and treatment panels share one sidebar slot; opening one
/// closes the other. The history drawer floats above both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub templates_open: bool,
    pub treatments_open: bool,
    pub history_open: bool,
    /// Active tab of the template panel
    pub category_tab: TemplateCategory,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            templates_open: true,
            treatments_open: false,
            history_open: false,
            category_tab: TemplateCategory::default(),
        }
    }
}

impl PanelState {
    pub fn show_templates(&mut self) {
        self.templates_open = true;
        self.treatments_open = false;
    }

    pub fn show_treatments(&mut self) {
        self.treatments_open = true;
        self.templates_open = false;
    }

    pub fn toggle_templates(&mut self) {
        if self.templates_open {
            self.templates_open = false;
        } else {
            self.show_templates();
        }
    }

    pub fn toggle_treatments(&mut self) {
        if self.treatments_open {
            self.treatments_open = false;
        } else {
            self.show_treatments();
        }
    }

    pub fn set_history_open(&mut self, open: bool) {
        self.history_open = open;
    }
}
