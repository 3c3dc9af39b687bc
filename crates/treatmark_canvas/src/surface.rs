//! The drawing surface contract.
//!
//! The annotation controller never owns drawing state; it issues commands
//! to a `DrawingSurface` and reads the scene back from it. Any whiteboard
//! satisfying this trait can be plugged in.

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CanvasError, Result};
use crate::scene::{DrawingElement, FileAsset, FileStore, SceneSnapshot};
use crate::tool::ToolKind;

/// Raster formats a surface can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Jpeg,
    Png,
}

impl RasterFormat {
    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Png => "image/png",
        }
    }

    /// Format for a MIME type, if it is one a surface can export.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" => Some(RasterFormat::Jpeg),
            "image/png" => Some(RasterFormat::Png),
            _ => None,
        }
    }
}

/// A flat raster rendering of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub format: RasterFormat,
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

/// A raster export in progress.
///
/// The future owns everything it needs, so the surface is not borrowed
/// while it runs.
pub type RasterExport = LocalBoxFuture<'static, Result<RasterImage>>;

/// Visible canvas area in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

/// Commands and queries the annotation controller issues to a whiteboard.
pub trait DrawingSurface {
    /// Current non-deleted scene elements.
    fn elements(&self) -> Result<Vec<DrawingElement>>;

    /// The complete registered-files store.
    fn files(&self) -> Result<FileStore>;

    /// Size of the visible canvas.
    fn viewport(&self) -> Viewport;

    /// Replace every scene element.
    fn replace_elements(&mut self, elements: Vec<DrawingElement>);

    /// Register binary assets by identifier.
    fn add_files(&mut self, files: Vec<FileAsset>);

    /// Switch the active tool.
    fn set_active_tool(&mut self, tool: ToolKind);

    /// Set the stroke color for new elements.
    fn set_stroke_color(&mut self, color: &str);

    /// Re-fit the viewport to the scene content.
    fn scroll_to_content(&mut self);

    /// Render the current scene, background images included, to a flat
    /// raster image.
    fn export_raster(&self, format: RasterFormat) -> RasterExport;

    /// Attach application metadata to a single element.
    fn set_custom_data(&mut self, element_id: &str, data: Value) -> Result<()> {
        let mut elements = self.elements()?;
        let element = elements
            .iter_mut()
            .find(|e| e.id == element_id)
            .ok_or_else(|| CanvasError::ElementNotFound(element_id.to_string()))?;
        element.custom_data = Some(data);
        self.replace_elements(elements);
        Ok(())
    }

    /// Read the whole scene as a snapshot.
    fn snapshot(&self) -> Result<SceneSnapshot> {
        Ok(SceneSnapshot::new(self.elements()?, self.files()?))
    }

    /// Replace the whole scene with a saved snapshot.
    fn load_scene(&mut self, scene: &SceneSnapshot) {
        self.add_files(scene.files.values().cloned().collect());
        self.replace_elements(scene.elements.clone());
        self.scroll_to_content();
    }
}
