//! Data models for the mapmark session core.

mod annotation;
mod annotation_type;
mod map;

pub use annotation::{
    Annotation, AnnotationDraft, AnnotationPatch, ValidationError, validate_description,
    validate_title,
};
pub use annotation_type::{AnnotationType, default_types, validate_type_name};
pub use map::{MapData, MapSummary};
