//! Treatmark - treatment markup on body diagrams
//!
//! Interaction controller for drawing treatment annotations over a body
//! diagram in an embedded whiteboard and saving them to a clinical record.
//! Natively the controller runs headless against any `DrawingSurface`; on
//! WASM it mounts on the desk page through `TreatmarkPage`.

pub mod api;
pub mod app;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod data_url;
pub mod error;
pub mod handlers;
pub mod host;
pub mod keybindings;
pub mod logging;
pub mod message;
pub mod model;
pub mod persistence;
pub mod placement;
pub mod state;
pub mod transport;

pub use api::{AnnotationApi, HistoryPage, ReferenceData, SaveAnnotationArgs};
pub use app::{Annotator, LoadReport, PendingSave, SaveOutcome};
pub use config::{AnnotatorConfig, ConfigError};
pub use error::{AnnotatorError, Result};
pub use host::{Indicator, LogNavigator, LogNotifier, Navigator, Notifier};
pub use message::{Command, Message};
pub use transport::{HttpTransport, RemoteError, Transport};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
