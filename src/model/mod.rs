//! Data models for the annotation tool.

mod history;
mod session;
mod tag;
mod template;
mod treatment;

pub use history::HistoryEntry;
pub use session::{ANNOTATION_NAME_KEY, RECORD_ID_KEY, RECORD_TYPE_KEY, SessionParams};
pub use tag::{TREATMENT_KEY, TreatmentTag};
pub use template::{FileIdAssignment, TemplateCategory, TemplateImage, TemplateLibrary};
pub use treatment::{Treatment, TreatmentCatalog, VariableSpec, VariableValues};
