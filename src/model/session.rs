//! Session parameters read from the page address.

use reqwest::Url;

use crate::error::{AnnotatorError, Result};

/// Query key naming the record type.
pub const RECORD_TYPE_KEY: &str = "doctype";
/// Query key naming the record id.
pub const RECORD_ID_KEY: &str = "docname";
/// Query key naming an existing annotation to update.
pub const ANNOTATION_NAME_KEY: &str = "annotation_name";

/// Identifies the record the annotation is attached to.
///
/// Built once at mount and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    record_type: String,
    record_id: String,
    annotation_name: Option<String>,
}

impl SessionParams {
    /// Create session parameters, rejecting empty record identifiers.
    pub fn new(
        record_type: impl Into<String>,
        record_id: impl Into<String>,
        annotation_name: Option<String>,
    ) -> Result<Self> {
        let record_type = record_type.into();
        let record_id = record_id.into();
        if record_type.trim().is_empty() || record_id.trim().is_empty() {
            return Err(AnnotatorError::MissingSession);
        }
        Ok(Self {
            record_type,
            record_id,
            annotation_name: annotation_name.filter(|name| !name.is_empty()),
        })
    }

    /// Parse a raw query string (`?doctype=Encounter&docname=ENC-0001`).
    ///
    /// The leading `?` is optional. Values are percent-decoded and `+` reads
    /// as a space.
    pub fn from_query(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut url = Url::parse("http://localhost/").map_err(|_| AnnotatorError::MissingSession)?;
        url.set_query(Some(query));
        Self::from_pairs(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
    }

    /// Parse the query part of a full page URL.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| {
            log::warn!("Unparseable page URL '{}': {}", url, e);
            AnnotatorError::MissingSession
        })?;
        Self::from_query(url.query().unwrap_or_default())
    }

    /// Build from key/value pairs. The last occurrence of a key wins and an
    /// empty value counts as absent.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record_type = None;
        let mut record_id = None;
        let mut annotation_name = None;

        for (key, value) in pairs {
            let slot = match key.as_ref() {
                RECORD_TYPE_KEY => &mut record_type,
                RECORD_ID_KEY => &mut record_id,
                ANNOTATION_NAME_KEY => &mut annotation_name,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());

        match (present(record_type), present(record_id)) {
            (Some(record_type), Some(record_id)) => {
                Self::new(record_type, record_id, present(annotation_name))
            }
            _ => Err(AnnotatorError::MissingSession),
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Existing annotation being updated, if any.
    pub fn annotation_name(&self) -> Option<&str> {
        self.annotation_name.as_deref()
    }

    /// Desk path of the record's form view, e.g. `/app/encounter/ENC-0001`.
    pub fn form_link(&self) -> String {
        let slug = self.record_type.trim().to_lowercase().replace(' ', "-");
        match Url::parse("http://localhost/app") {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.push(&slug).push(&self.record_id);
                }
                url.path().to_string()
            }
            Err(_) => format!("/app/{}/{}", slug, self.record_id),
        }
    }
}
