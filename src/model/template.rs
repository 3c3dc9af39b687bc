//! Background body-diagram templates.

use std::fmt;

/// Template partition shown as a tab in the template panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateCategory {
    #[default]
    Male,
    Female,
}

impl TemplateCategory {
    /// Parse the backend's `gender` field.
    pub fn from_gender(gender: &str) -> Option<Self> {
        match gender {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }

    /// Get the display name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// All categories in tab order.
    pub fn all() -> &'static [TemplateCategory] {
        &[Self::Male, Self::Female]
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A selectable background image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateImage {
    /// Backend document name, sent as `annotation_template` on save
    pub name: String,
    /// Display label; also the id of the placed image element
    pub label: String,
    pub category: TemplateCategory,
    /// Pediatric diagram
    pub kid: bool,
    /// Image source: a `data:` URL or a site-relative file URL
    pub image: String,
    /// Whiteboard file id, assigned on first placement
    pub file_id: Option<String>,
}

impl TemplateImage {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        category: TemplateCategory,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            category,
            kid: false,
            image: image.into(),
            file_id: None,
        }
    }
}

/// Outcome of `TemplateLibrary::assign_file_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdAssignment {
    pub file_id: String,
    /// True when the id was created now and the asset must be registered
    pub is_new: bool,
}

/// Templates partitioned by category, each in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLibrary {
    male: Vec<TemplateImage>,
    female: Vec<TemplateImage>,
}

impl TemplateLibrary {
    /// Partition templates by category, preserving order.
    pub fn new(templates: impl IntoIterator<Item = TemplateImage>) -> Self {
        let mut library = Self::default();
        for template in templates {
            library.list_mut(template.category).push(template);
        }
        library
    }

    /// Templates of one category.
    pub fn category(&self, category: TemplateCategory) -> &[TemplateImage] {
        match category {
            TemplateCategory::Male => &self.male,
            TemplateCategory::Female => &self.female,
        }
    }

    fn list_mut(&mut self, category: TemplateCategory) -> &mut Vec<TemplateImage> {
        match category {
            TemplateCategory::Male => &mut self.male,
            TemplateCategory::Female => &mut self.female,
        }
    }

    pub fn get(&self, category: TemplateCategory, index: usize) -> Option<&TemplateImage> {
        self.category(category).get(index)
    }

    pub fn len(&self) -> usize {
        self.male.len() + self.female.len()
    }

    pub fn is_empty(&self) -> bool {
        self.male.is_empty() && self.female.is_empty()
    }

    /// Return the template's file id, creating `<name>-<millis>` on first use.
    ///
    /// A new id is cached on every template of the same category that shares
    /// the image source. Returns None for an unknown index.
    pub fn assign_file_id(
        &mut self,
        category: TemplateCategory,
        index: usize,
        now_millis: i64,
    ) -> Option<FileIdAssignment> {
        let list = self.list_mut(category);
        let template = list.get(index)?;
        if let Some(file_id) = &template.file_id {
            return Some(FileIdAssignment {
                file_id: file_id.clone(),
                is_new: false,
            });
        }

        let file_id = format!("{}-{}", template.name, now_millis);
        let image = template.image.clone();
        for other in list.iter_mut().filter(|t| t.image == image) {
            other.file_id = Some(file_id.clone());
        }
        log::debug!("🖼️ Assigned file id {}", file_id);

        Some(FileIdAssignment {
            file_id,
            is_new: true,
        })
    }
}
