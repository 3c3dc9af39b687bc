//! Typed wrappers around the annotation backend's remote procedures.
//!
//! Wire records mirror the backend's JSON and are converted into the
//! domain model on arrival.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::color_utils::Color;
use crate::config::ProceduresConfig;
use crate::model::{
    HistoryEntry, SessionParams, TemplateCategory, TemplateImage, TemplateLibrary, Treatment,
    TreatmentCatalog, VariableSpec,
};
use crate::transport::{RemoteError, Transport};
use treatmark_canvas::SceneSnapshot;

/// Variable field types understood by the editing panel.
const VARIABLE_TYPE_TEXT: &str = "Data";
const VARIABLE_TYPE_SELECT: &str = "Select";

/// Payload of the reference-data procedure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationRecords {
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
    #[serde(default)]
    pub treatments: Vec<TreatmentRecord>,
}

/// A template image as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRecord {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub kid: bool,
    #[serde(default)]
    pub image: Option<String>,
}

/// A treatment as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentRecord {
    /// Treatment id stored in stroke tags
    pub treatment: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

/// A row of a treatment's variable table.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableRecord {
    pub variable_name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Newline-separated select options
    #[serde(default)]
    pub options: Option<String>,
}

/// A saved annotation as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub name: String,
    #[serde(default)]
    pub annotation_template: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub creation: Option<String>,
}

/// Arguments of the save procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAnnotationArgs {
    pub doctype: String,
    pub docname: String,
    pub annotation_name: Option<String>,
    pub annotation_template: Option<String>,
    /// Serialized `{elements, files}` scene
    pub json_text: String,
    /// Raster preview as a `data:image/...;base64,` URL
    pub file_data: String,
}

/// Treatments and templates, converted to the domain model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub catalog: TreatmentCatalog,
    pub library: TemplateLibrary,
}

/// Saved annotations for one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    /// Names of entries whose stored scene could not be decoded
    pub unreadable: Vec<String>,
}

fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(s) => match s.trim() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(de::Error::custom(format!("expected a flag, got '{}'", other))),
        },
        other => Err(de::Error::custom(format!("expected a flag, got {}", other))),
    }
}

impl VariableRecord {
    /// Convert to a variable spec; unsupported field types yield None.
    pub fn into_spec(self) -> Option<VariableSpec> {
        match self.kind.as_deref() {
            Some(VARIABLE_TYPE_TEXT) => Some(VariableSpec::text(self.variable_name)),
            Some(VARIABLE_TYPE_SELECT) => {
                let options = self
                    .options
                    .unwrap_or_default()
                    .lines()
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                Some(VariableSpec::select(self.variable_name, options))
            }
            other => {
                log::debug!(
                    "Ignoring variable '{}' of unsupported type {:?}",
                    self.variable_name,
                    other
                );
                None
            }
        }
    }
}

impl From<TreatmentRecord> for Treatment {
    fn from(record: TreatmentRecord) -> Self {
        let name = record.name.unwrap_or_else(|| record.treatment.clone());
        Treatment {
            id: record.treatment,
            name,
            color: record.color,
            variables: record
                .variables
                .into_iter()
                .filter_map(VariableRecord::into_spec)
                .collect(),
        }
    }
}

impl TemplateRecord {
    /// Convert to a template; records with an unknown gender yield None.
    pub fn into_template(self) -> Option<TemplateImage> {
        let Some(category) = self.gender.as_deref().and_then(TemplateCategory::from_gender) else {
            log::warn!(
                "Skipping template '{}' with unknown gender {:?}",
                self.name,
                self.gender
            );
            return None;
        };
        let label = self.label.unwrap_or_else(|| self.name.clone());
        let mut template =
            TemplateImage::new(self.name, label, category, self.image.unwrap_or_default());
        template.kid = self.kid;
        Some(template)
    }
}

impl HistoryRecord {
    /// Decode the stored scene into a history entry.
    pub fn into_entry(self) -> Result<HistoryEntry, serde_json::Error> {
        let scene: SceneSnapshot = serde_json::from_str(self.json.as_deref().unwrap_or_default())?;
        Ok(HistoryEntry {
            name: self.name,
            template: self.annotation_template.filter(|t| !t.is_empty()),
            preview_image: self.image.filter(|i| !i.is_empty()),
            created_at: self.creation.unwrap_or_default(),
            scene,
        })
    }
}

impl From<AnnotationRecords> for ReferenceData {
    fn from(records: AnnotationRecords) -> Self {
        Self {
            catalog: TreatmentCatalog::new(
                records.treatments.into_iter().map(Treatment::from).collect(),
            ),
            library: TemplateLibrary::new(
                records
                    .templates
                    .into_iter()
                    .filter_map(TemplateRecord::into_template),
            ),
        }
    }
}

/// The backend's annotation procedures over an injected transport.
pub struct AnnotationApi {
    transport: Box<dyn Transport>,
    procedures: ProceduresConfig,
}

impl AnnotationApi {
    pub fn new(transport: Box<dyn Transport>, procedures: ProceduresConfig) -> Self {
        Self {
            transport,
            procedures,
        }
    }

    /// Fetch treatments and templates.
    pub async fn annotations_records(&self) -> Result<ReferenceData, RemoteError> {
        let method = &self.procedures.records;
        let value = self.transport.call(method, json!({})).await?;
        let records: AnnotationRecords =
            serde_json::from_value(value).map_err(|e| RemoteError::decode(method, e))?;
        Ok(records.into())
    }

    /// Fetch saved annotations for the session's record.
    ///
    /// Entries whose scene cannot be decoded are left out and named in
    /// `HistoryPage::unreadable`.
    pub async fn annotation_history(
        &self,
        session: &SessionParams,
    ) -> Result<HistoryPage, RemoteError> {
        let method = &self.procedures.history;
        let args = json!({
            "doctype": session.record_type(),
            "docname": session.record_id(),
        });
        let value = self.transport.call(method, args).await?;
        let records: Vec<HistoryRecord> = match value {
            Value::Null => Vec::new(),
            value => serde_json::from_value(value).map_err(|e| RemoteError::decode(method, e))?,
        };

        let mut page = HistoryPage::default();
        for record in records {
            let name = record.name.clone();
            match record.into_entry() {
                Ok(entry) => page.entries.push(entry),
                Err(e) => {
                    log::warn!("Unreadable history entry '{}': {}", name, e);
                    page.unreadable.push(name);
                }
            }
        }
        Ok(page)
    }

    /// Persist one annotation.
    pub async fn save_annotation(&self, args: &SaveAnnotationArgs) -> Result<Value, RemoteError> {
        let method = &self.procedures.save;
        let args = serde_json::to_value(args).map_err(|e| RemoteError::invalid_request(method, e))?;
        self.transport.call(method, args).await
    }

    /// Download a template image.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        self.transport.fetch_bytes(url).await
    }
}
