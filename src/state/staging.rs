//! Per-treatment variable values backing the editing panel.

use std::collections::BTreeMap;

use crate::model::{TreatmentCatalog, VariableValues};

/// Transient variable values, keyed by treatment id.
///
/// A placed stroke's own metadata is authoritative; this map is the buffer
/// the panel edits and that gets pushed onto strokes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingMap {
    values: BTreeMap<String, VariableValues>,
}

impl StagingMap {
    /// Every variable of every treatment mapped to the empty string.
    pub fn from_catalog(catalog: &TreatmentCatalog) -> Self {
        Self {
            values: catalog
                .iter()
                .map(|t| (t.id.clone(), t.empty_values()))
                .collect(),
        }
    }

    /// Staged values for a treatment.
    pub fn get(&self, treatment_id: &str) -> Option<&VariableValues> {
        self.values.get(treatment_id)
    }

    /// A copy of the staged values for a treatment; empty when none were staged.
    pub fn snapshot(&self, treatment_id: &str) -> VariableValues {
        self.values.get(treatment_id).cloned().unwrap_or_default()
    }

    /// Staged value of a single variable.
    pub fn value(&self, treatment_id: &str, name: &str) -> Option<&str> {
        self.values
            .get(treatment_id)
            .and_then(|values| values.get(name))
            .map(String::as_str)
    }

    /// Set one variable.
    pub fn set(&mut self, treatment_id: &str, name: &str, value: &str) {
        self.values
            .entry(treatment_id.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    /// Replace all values of a treatment.
    pub fn replace(&mut self, treatment_id: &str, values: VariableValues) {
        self.values.insert(treatment_id.to_string(), values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_utils::Color;
    use crate::model::{Treatment, VariableSpec};

    #[test]
    fn test_from_catalog_initialises_empty() {
        let catalog = TreatmentCatalog::new(vec![
            Treatment::new("Suture", Color::default()).with_variable(VariableSpec::text("notes")),
            Treatment::new("Graft", Color::default()),
        ]);
        let staging = StagingMap::from_catalog(&catalog);
        assert_eq!(staging.value("Suture", "notes"), Some(""));
        assert_eq!(staging.get("Graft").map(|v| v.len()), Some(0));
        assert_eq!(staging.get("Laser"), None);
    }

    #[test]
    fn test_set_and_replace() {
        let mut staging = StagingMap::default();
        staging.set("Suture", "notes", "deep");
        assert_eq!(staging.value("Suture", "notes"), Some("deep"));

        staging.replace("Suture", [("length".to_string(), "3cm".to_string())].into());
        assert_eq!(staging.value("Suture", "notes"), None);
        assert_eq!(staging.snapshot("Suture").len(), 1);
    }
}
