//! Annotation records and their field validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};

/// Errors raised by field validation, before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming
    #[error("title must not be empty")]
    EmptyTitle,

    /// Title exceeds the maximum length
    #[error("title is {len} characters, maximum is {max}")]
    TitleTooLong { len: usize, max: usize },

    /// Description exceeds the maximum length
    #[error("description is {len} characters, maximum is {max}")]
    DescriptionTooLong { len: usize, max: usize },

    /// Type name is empty after trimming
    #[error("type name must not be empty")]
    EmptyTypeName,

    /// Type name exceeds the maximum length
    #[error("type name is {len} characters, maximum is {max}")]
    TypeNameTooLong { len: usize, max: usize },
}

/// Check an annotation title: required, non-empty after trimming, bounded.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyTitle);
    }
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(())
}

/// Check an annotation description: optional but bounded.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    let len = description.trim().chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

/// A typed, positioned point-of-interest record on a map.
///
/// The `id` is stable for the annotation's lifetime. Annotations created
/// locally carry a freshly generated id that is provisional until the first
/// successful save; annotations loaded from the backend carry the
/// server-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier within the map's collection.
    pub id: String,
    /// Type catalog id. Carried as opaque data; the catalog gives it meaning.
    #[serde(rename = "type")]
    pub type_id: String,
    /// X position in image coordinate space.
    pub x: f64,
    /// Y position in image coordinate space.
    pub y: f64,
    /// Required display title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: String,
}

impl Annotation {
    /// Create an annotation with a freshly generated client-side id.
    pub fn new(
        type_id: impl Into<String>,
        x: f64,
        y: f64,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            type_id: type_id.into(),
            x,
            y,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Check this annotation's field constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(&self.description)
    }
}

/// Payload for creating an annotation on the backend. No id: the server
/// assigns one and returns it in the created record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDraft {
    #[serde(rename = "type")]
    pub type_id: String,
    pub x: f64,
    pub y: f64,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl From<&Annotation> for AnnotationDraft {
    fn from(annotation: &Annotation) -> Self {
        Self {
            type_id: annotation.type_id.clone(),
            x: annotation.x,
            y: annotation.y,
            title: annotation.title.clone(),
            description: annotation.description.clone(),
        }
    }
}

/// Partial update for an annotation. Absent fields are left untouched and
/// omitted from the wire payload; the id itself is never patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AnnotationPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type id.
    pub fn type_id(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    /// Set the position.
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.type_id.is_none()
            && self.x.is_none()
            && self.y.is_none()
            && self.title.is_none()
            && self.description.is_none()
    }

    /// Check field constraints on the present fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Merge the present fields into an annotation.
    pub fn apply(&self, annotation: &mut Annotation) {
        if let Some(type_id) = &self.type_id {
            annotation.type_id = type_id.clone();
        }
        if let Some(x) = self.x {
            annotation.x = x;
        }
        if let Some(y) = self.y {
            annotation.y = y;
        }
        if let Some(title) = &self.title {
            annotation.title = title.clone();
        }
        if let Some(description) = &self.description {
            annotation.description = description.clone();
        }
    }
}

impl From<&Annotation> for AnnotationPatch {
    /// Full-field patch, as sent when rewriting an annotation on save.
    fn from(annotation: &Annotation) -> Self {
        Self {
            type_id: Some(annotation.type_id.clone()),
            x: Some(annotation.x),
            y: Some(annotation.y),
            title: Some(annotation.title.clone()),
            description: Some(annotation.description.clone()),
        }
    }
}
