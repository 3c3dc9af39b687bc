//! Global constants for the annotation tool

/// Remote procedure returning treatments and template images
pub const METHOD_ANNOTATION_RECORDS: &str = "annotation.api.annotations_records";

/// Remote procedure returning saved annotations for a record's patient
pub const METHOD_ANNOTATION_HISTORY: &str = "annotation.api.get_annotation_history";

/// Remote procedure persisting one annotation
pub const METHOD_SAVE_ANNOTATION: &str = "annotation.api.save_annotation";

/// Header carrying the site hostname on every call
pub const SITE_NAME_HEADER: &str = "X-Frappe-Site-Name";

/// Header carrying the cross-site-request-forgery token
pub const CSRF_HEADER: &str = "X-Frappe-CSRF-Token";

/// Unrendered CSRF template value; never sent as a token
pub const CSRF_PLACEHOLDER: &str = "{{ csrf_token }}";

/// Delay between the save confirmation and navigation, in milliseconds
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 1000;

/// Default stroke color of the whiteboard, used when a treatment color is unusable
pub const DEFAULT_STROKE_COLOR: &str = "#1e1e1e";

/// MIME type background templates are re-encoded to before registration
pub const TEMPLATE_MIME_TYPE: &str = "image/jpeg";

/// Shown when the page is opened without a record to attach to
pub const MISSING_SESSION_MESSAGE: &str =
    "Please open the annotation from an encounter or a procedure!";

/// Confirmation shown after a successful save
pub const SAVED_TITLE: &str = "Saved";

/// Confirmation body shown after a successful save
pub const SAVED_MESSAGE: &str = "Annotation saved successfully!";
