//! mapmark — client-side session core for a map annotation editor.
//!
//! Holds the working set of annotations for the currently open map, layers
//! bounded undo/redo on top of it, reconciles local edits with a CRUD
//! backend at save time, and manages the user-definable annotation type
//! catalog. Rendering and forms live in the UI shell; this crate is the
//! state they call into.

pub mod api;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod undo;

pub use api::{ApiError, HttpMapApi, MapApi};
pub use catalog::{
    CatalogError, CatalogStorage, FileCatalogStorage, MemoryCatalogStorage, TypeCatalog,
};
pub use config::{AppConfig, ConfigError, LogLevel};
pub use model::{
    Annotation, AnnotationDraft, AnnotationPatch, AnnotationType, MapData, MapSummary,
    ValidationError,
};
pub use reconcile::{SaveError, SavePlan, SaveReport, open_map, plan_save, save_map};
pub use store::{AnnotationStore, FormState, OpenMap, StoreError};
pub use undo::{Snapshot, UndoConfig, UndoStack};
