//! Previously saved annotations for the current record.

use treatmark_canvas::SceneSnapshot;

/// One saved annotation, read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Backend document name
    pub name: String,
    /// Background template used, if any
    pub template: Option<String>,
    /// URL of the stored raster preview
    pub preview_image: Option<String>,
    /// Backend creation timestamp, as sent
    pub created_at: String,
    pub scene: SceneSnapshot,
}

impl HistoryEntry {
    /// Number of live elements in the saved scene.
    pub fn element_count(&self) -> usize {
        self.scene.live_elements().count()
    }
}
