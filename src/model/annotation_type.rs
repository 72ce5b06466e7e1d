//! Annotation type catalog entries.

use serde::{Deserialize, Serialize};

use super::annotation::ValidationError;
use crate::constants::MAX_TYPE_NAME_LEN;

/// Check a type name: required, non-empty after trimming, bounded.
pub fn validate_type_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyTypeName);
    }
    if len > MAX_TYPE_NAME_LEN {
        return Err(ValidationError::TypeNameTooLong {
            len,
            max: MAX_TYPE_NAME_LEN,
        });
    }
    Ok(())
}

/// A user-definable annotation category: a display name plus a marker icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationType {
    /// Slug identifier, e.g. `city` or `custom-1699999999999`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Marker emoji.
    pub icon: String,
    /// Built-in entries are permanent and cannot be deleted.
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl AnnotationType {
    /// Create a custom (deletable) type entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            is_default: false,
        }
    }
}

/// The built-in types every catalog starts with.
pub fn default_types() -> Vec<AnnotationType> {
    [
        ("city", "City", "🏛️"),
        ("person", "Person", "👤"),
        ("event", "Event", "⚡"),
        ("note", "Note", "📝"),
    ]
    .into_iter()
    .map(|(id, name, icon)| AnnotationType {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        is_default: true,
    })
    .collect()
}
