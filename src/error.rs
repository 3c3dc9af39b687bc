//! Error types for the annotation controller.

use thiserror::Error;
use treatmark_canvas::CanvasError;

use crate::constants::MISSING_SESSION_MESSAGE;
use crate::transport::RemoteError;

/// Errors surfaced to the user by the annotation controller.
///
/// Every variant is terminal for the action that triggered it.
#[derive(Error, Debug)]
pub enum AnnotatorError {
    /// The page was opened without a record type or record id
    #[error("{}", MISSING_SESSION_MESSAGE)]
    MissingSession,

    /// No whiteboard is attached yet
    #[error("Drawing surface not available!")]
    SurfaceUnavailable,

    /// Save was requested on an empty scene
    #[error("Nothing to save: the drawing has no elements")]
    EmptyScene,

    /// Remote procedure failure
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A background image could not be fetched or decoded
    #[error("Failed to load image: {message}")]
    AssetLoad {
        /// What went wrong
        message: String,
    },

    /// Scene JSON could not be read or written
    #[error("Invalid scene data: {0}")]
    SceneData(#[from] serde_json::Error),

    /// The whiteboard rejected a command
    #[error("Drawing surface error: {0}")]
    Canvas(#[from] CanvasError),

    /// A treatment id that is not in the loaded catalog
    #[error("Unknown treatment: {0}")]
    UnknownTreatment(String),

    /// A variable that the treatment does not define, or a value outside its options
    #[error("Invalid value for '{variable}': {message}")]
    InvalidVariable {
        /// Variable name
        variable: String,
        /// Description of the problem
        message: String,
    },

    /// Saved annotations whose scene could not be decoded
    #[error("Could not read saved annotation(s): {}", names.join(", "))]
    UnreadableHistory {
        /// Backend names of the skipped entries
        names: Vec<String>,
    },

    /// A list index that does not exist (history entry, template)
    #[error("No {what} at index {index}")]
    OutOfRange {
        /// What was being indexed
        what: &'static str,
        /// The offending index
        index: usize,
    },
}

impl AnnotatorError {
    /// Create an asset load error with a message.
    pub fn asset_load(message: impl Into<String>) -> Self {
        Self::AssetLoad {
            message: message.into(),
        }
    }

    /// Create an invalid variable error.
    pub fn invalid_variable(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVariable {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// True for failures caused by unmet preconditions rather than I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingSession | Self::SurfaceUnavailable | Self::EmptyScene
        )
    }
}

/// Result alias for controller operations.
pub type Result<T> = std::result::Result<T, AnnotatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_message() {
        assert_eq!(
            AnnotatorError::MissingSession.to_string(),
            "Please open the annotation from an encounter or a procedure!"
        );
        assert!(AnnotatorError::MissingSession.is_precondition());
    }

    #[test]
    fn test_remote_error_is_transparent() {
        let err = AnnotatorError::from(RemoteError::rejected(
            "annotation.api.save_annotation",
            417,
            Some("ValidationError".to_string()),
            Some("File data is missing".to_string()),
        ));
        assert_eq!(
            err.to_string(),
            "annotation.api.save_annotation failed: ValidationError\nFile data is missing"
        );
        assert!(!err.is_precondition());
    }
}
