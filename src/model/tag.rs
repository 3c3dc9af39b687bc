//! Treatment tags attached to freehand strokes.
//!
//! The whiteboard stores a tag in the element's `customData` as one flat
//! object: the treatment id under `type` next to the variable values.

use serde_json::{Map, Value};

use super::treatment::VariableValues;

/// Key holding the treatment id inside an element's custom data.
pub const TREATMENT_KEY: &str = "type";

/// Metadata tying a stroke to a treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatmentTag {
    pub treatment_id: String,
    pub variable_values: VariableValues,
}

impl TreatmentTag {
    /// Create a tag for a treatment with the given values.
    pub fn new(treatment_id: impl Into<String>, variable_values: VariableValues) -> Self {
        Self {
            treatment_id: treatment_id.into(),
            variable_values,
        }
    }

    /// Flatten into the custom data object stored on the element.
    pub fn to_custom_data(&self) -> Value {
        let mut object: Map<String, Value> = self
            .variable_values
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value.as_str())))
            .collect();
        object.insert(
            TREATMENT_KEY.to_string(),
            Value::from(self.treatment_id.as_str()),
        );
        Value::Object(object)
    }

    /// Read a tag back from an element's custom data.
    ///
    /// Returns None when the data is not an object or names no treatment.
    /// Non-string values are kept in their JSON text form.
    pub fn from_custom_data(data: &Value) -> Option<Self> {
        let object = data.as_object()?;
        let treatment_id = object
            .get(TREATMENT_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())?;

        let variable_values = object
            .iter()
            .filter(|(key, _)| key.as_str() != TREATMENT_KEY)
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();

        Some(Self::new(treatment_id, variable_values))
    }
}
