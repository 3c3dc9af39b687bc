//! Whiteboard contract for the treatment annotation tool.
//!
//! Defines the scene data model, the events a whiteboard reports, and the
//! `DrawingSurface` trait the annotation controller drives. `MemorySurface`
//! is a complete headless implementation.

pub mod error;
pub mod event;
pub mod memory;
pub mod raster;
pub mod scene;
pub mod surface;
pub mod tool;

pub use error::{CanvasError, Result};
pub use event::{PointerDown, SceneChange};
pub use memory::MemorySurface;
pub use scene::{
    DrawingElement, FileAsset, FileStore, SceneSnapshot, parse_files, parse_live_elements,
};
pub use surface::{DrawingSurface, RasterExport, RasterFormat, RasterImage, Viewport};
pub use tool::{ElementType, PointerButton, ToolKind};
