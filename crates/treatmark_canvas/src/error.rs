use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Element not found on canvas: {0}")]
    ElementNotFound(String),

    #[error("Scene has no elements to render")]
    EmptyScene,

    #[error("Scene JSON error: {0}")]
    SceneJson(#[from] serde_json::Error),

    #[error("Unreadable scene data: {0}")]
    SceneData(String),

    #[error("Whiteboard export failed: {0}")]
    Export(String),

    #[error("Raster export failed: {0}")]
    Raster(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, CanvasError>;
