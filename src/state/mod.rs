//! Controller state: tagging machine, staging buffer and panels.

mod panels;
mod staging;
mod tagging;

pub use panels::PanelState;
pub use staging::StagingMap;
pub use tagging::{Effect, TaggingEvent, TaggingMachine, TaggingState};
