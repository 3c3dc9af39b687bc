//! Treatment definitions and their typed variables.

use std::collections::BTreeMap;

use crate::color_utils::Color;
use crate::error::{AnnotatorError, Result};

/// Values entered for a treatment's variables, keyed by variable name.
pub type VariableValues = BTreeMap<String, String>;

/// A variable a clinician fills in for a tagged stroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableSpec {
    /// Free-text field
    Text { name: String },
    /// One value out of a fixed list
    Select { name: String, options: Vec<String> },
}

impl VariableSpec {
    /// Create a free-text variable.
    pub fn text(name: impl Into<String>) -> Self {
        Self::Text { name: name.into() }
    }

    /// Create an enumerated variable.
    pub fn select<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Select {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name } | Self::Select { name, .. } => name,
        }
    }

    /// Options for a select variable; empty for text.
    pub fn options(&self) -> &[String] {
        match self {
            Self::Text { .. } => &[],
            Self::Select { options, .. } => options,
        }
    }

    /// Check a value against this variable. The empty string clears any field.
    pub fn validate(&self, value: &str) -> Result<()> {
        match self {
            Self::Text { .. } => Ok(()),
            Self::Select { name, options } => {
                if value.is_empty() || options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err(AnnotatorError::invalid_variable(
                        name,
                        format!("'{}' is not one of {}", value, options.join(", ")),
                    ))
                }
            }
        }
    }
}

/// A clinical treatment that strokes can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treatment {
    /// Identifier stored in stroke metadata
    pub id: String,
    /// Backend document name
    pub name: String,
    /// Stroke color used while the treatment is armed
    pub color: Color,
    pub variables: Vec<VariableSpec>,
}

impl Treatment {
    /// Create a treatment with no variables.
    pub fn new(id: impl Into<String>, color: Color) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            color,
            variables: Vec::new(),
        }
    }

    /// Add a variable (builder style).
    pub fn with_variable(mut self, variable: VariableSpec) -> Self {
        self.variables.push(variable);
        self
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name() == name)
    }

    /// Check that `name` is one of this treatment's variables and `value` fits it.
    pub fn validate(&self, name: &str, value: &str) -> Result<()> {
        self.variable(name)
            .ok_or_else(|| {
                AnnotatorError::invalid_variable(
                    name,
                    format!("not a variable of treatment '{}'", self.id),
                )
            })?
            .validate(value)
    }

    /// Every variable mapped to the empty string.
    pub fn empty_values(&self) -> VariableValues {
        self.variables
            .iter()
            .map(|v| (v.name().to_string(), String::new()))
            .collect()
    }
}

/// The treatments loaded for this session, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreatmentCatalog {
    treatments: Vec<Treatment>,
}

impl TreatmentCatalog {
    pub fn new(treatments: Vec<Treatment>) -> Self {
        Self { treatments }
    }

    /// Look up a treatment by id.
    pub fn get(&self, id: &str) -> Option<&Treatment> {
        self.treatments.iter().find(|t| t.id == id)
    }

    /// Look up a treatment by id, failing for unknown ids.
    pub fn require(&self, id: &str) -> Result<&Treatment> {
        self.get(id)
            .ok_or_else(|| AnnotatorError::UnknownTreatment(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Treatment> {
        self.treatments.iter()
    }

    pub fn len(&self) -> usize {
        self.treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty()
    }
}
