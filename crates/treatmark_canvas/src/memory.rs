//! In-memory drawing surface for headless use.

use futures::FutureExt;

use crate::error::Result;
use crate::raster::render_scene;
use crate::scene::{DrawingElement, FileAsset, FileStore, SceneSnapshot};
use crate::surface::{DrawingSurface, RasterExport, RasterFormat, Viewport};
use crate::tool::ToolKind;

/// A `DrawingSurface` that keeps the scene in plain vectors.
///
/// Deleted elements are kept (as the whiteboard does) but never reported
/// by `elements()`.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    elements: Vec<DrawingElement>,
    files: FileStore,
    viewport: Viewport,
    active_tool: ToolKind,
    stroke_color: Option<String>,
    scroll_count: usize,
}

impl MemorySurface {
    /// Create an empty surface with the default viewport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty surface with a specific viewport size.
    pub fn with_viewport(width: f64, height: f64) -> Self {
        Self {
            viewport: Viewport { width, height },
            ..Self::default()
        }
    }

    /// Append an element, as the whiteboard does when a stroke starts.
    pub fn push_element(&mut self, element: DrawingElement) {
        self.elements.push(element);
    }

    /// Mark an element deleted.
    pub fn delete_element(&mut self, element_id: &str) {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id == element_id) {
            element.is_deleted = true;
        }
    }

    /// Look up a live element by id.
    pub fn element(&self, element_id: &str) -> Option<&DrawingElement> {
        self.elements
            .iter()
            .find(|e| e.id == element_id && !e.is_deleted)
    }

    /// The currently active tool.
    pub fn active_tool(&self) -> &ToolKind {
        &self.active_tool
    }

    /// The stroke color for new elements, if one was set.
    pub fn stroke_color(&self) -> Option<&str> {
        self.stroke_color.as_deref()
    }

    /// How many times the viewport was re-fitted to content.
    pub fn scroll_count(&self) -> usize {
        self.scroll_count
    }
}

impl DrawingSurface for MemorySurface {
    fn elements(&self) -> Result<Vec<DrawingElement>> {
        Ok(self
            .elements
            .iter()
            .filter(|e| !e.is_deleted)
            .cloned()
            .collect())
    }

    fn files(&self) -> Result<FileStore> {
        Ok(self.files.clone())
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn replace_elements(&mut self, elements: Vec<DrawingElement>) {
        self.elements = elements;
    }

    fn add_files(&mut self, files: Vec<FileAsset>) {
        for file in files {
            self.files.insert(file.id.clone(), file);
        }
    }

    fn set_active_tool(&mut self, tool: ToolKind) {
        log::trace!("Surface tool -> {}", tool.as_str());
        self.active_tool = tool;
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.stroke_color = Some(color.to_string());
    }

    fn scroll_to_content(&mut self) {
        self.scroll_count += 1;
    }

    /// Renders eagerly with the wireframe preview renderer.
    fn export_raster(&self, format: RasterFormat) -> RasterExport {
        let live = self.elements.iter().filter(|e| !e.is_deleted).cloned().collect();
        let result = render_scene(&SceneSnapshot::new(live, FileStore::new()), format);
        futures::future::ready(result).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CanvasError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stroke(id: &str) -> DrawingElement {
        DrawingElement::freedraw(id, (0.0, 0.0), vec![[0.0, 0.0], [5.0, 5.0]], "#000000")
    }

    #[test]
    fn test_set_custom_data_targets_one_element() {
        let mut surface = MemorySurface::new();
        surface.push_element(stroke("a"));
        surface.push_element(stroke("b"));

        surface
            .set_custom_data("b", json!({ "type": "Suture" }))
            .unwrap();

        assert_eq!(surface.element("a").unwrap().custom_data, None);
        assert_eq!(
            surface.element("b").unwrap().custom_data,
            Some(json!({ "type": "Suture" }))
        );
    }

    #[test]
    fn test_set_custom_data_unknown_element() {
        let mut surface = MemorySurface::new();
        let result = surface.set_custom_data("missing", json!({}));
        assert!(matches!(result, Err(CanvasError::ElementNotFound(id)) if id == "missing"));
    }

    #[test]
    fn test_deleted_elements_are_hidden() {
        let mut surface = MemorySurface::new();
        surface.push_element(stroke("a"));
        surface.delete_element("a");
        assert!(surface.elements().unwrap().is_empty());
        assert!(surface.element("a").is_none());
    }

    #[test]
    fn test_load_scene_replaces_elements_and_merges_files() {
        let mut surface = MemorySurface::new();
        surface.push_element(stroke("old"));
        surface.add_files(vec![FileAsset::new("f0", "image/png", "data:image/png;base64,", 0)]);

        let mut files = FileStore::new();
        files.insert(
            "f1".to_string(),
            FileAsset::new("f1", "image/jpeg", "data:image/jpeg;base64,", 1),
        );
        let scene = SceneSnapshot::new(vec![stroke("new")], files);
        surface.load_scene(&scene);

        let ids: Vec<String> = surface
            .elements()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["new".to_string()]);
        assert_eq!(surface.files().unwrap().len(), 2);
        assert_eq!(surface.scroll_count(), 1);
    }

    #[test]
    fn test_snapshot_reads_elements_and_files() {
        let mut surface = MemorySurface::with_viewport(800.0, 600.0);
        surface.push_element(stroke("a"));
        let snapshot = surface.snapshot().unwrap();
        assert_eq!(snapshot.elements.len(), 1);
        assert_eq!(surface.viewport().height, 600.0);
    }

    #[test]
    fn test_export_does_not_borrow_surface() {
        let mut surface = MemorySurface::new();
        surface.push_element(stroke("a"));
        let export = surface.export_raster(RasterFormat::Png);
        surface.push_element(stroke("b"));

        let image = pollster::block_on(export).unwrap();
        assert_eq!(image.format, RasterFormat::Png);
        assert!(!image.bytes.is_empty());
    }
}
