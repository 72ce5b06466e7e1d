//! Annotation type catalog with persistence and deletion cascade.
//!
//! The catalog is process-wide state independent of any single map: it maps
//! type ids to display metadata and survives across sessions through an
//! injected [`CatalogStorage`] collaborator. Every mutating call flushes the
//! full catalog back to storage.
//!
//! Deleting a type that annotations still reference first retypes those
//! annotations to the fallback type, so the collection never holds a type
//! id without a catalog entry.

use std::cell::RefCell;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::constants::{FALLBACK_TYPE_ICON, FALLBACK_TYPE_ID};
use crate::model::{AnnotationType, ValidationError, default_types, validate_type_name};
use crate::store::AnnotationStore;

/// Errors from catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Field constraints rejected the input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Built-in types are permanent
    #[error("cannot delete built-in type '{id}'")]
    Forbidden { id: String },

    /// No catalog entry with this id
    #[error("no annotation type with id '{id}'")]
    NotFound { id: String },

    /// I/O error talking to the storage collaborator
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the catalog persists itself.
///
/// Injected so the application can use a config-directory file while tests
/// run against memory. The payload is the catalog's JSON rendering: an
/// array of `{id, name, icon, isDefault}` objects.
pub trait CatalogStorage {
    /// Load the raw persisted catalog, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<String>, CatalogError>;

    /// Persist the raw catalog, replacing any previous contents.
    fn save(&self, json: &str) -> Result<(), CatalogError>;
}

/// File-backed catalog storage.
pub struct FileCatalogStorage {
    path: PathBuf,
}

impl FileCatalogStorage {
    /// Storage at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default storage location under the user config directory.
    /// Returns None when no config directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("mapmark").join("annotation-types.json"))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join("mapmark")
                    .join("annotation-types.json")
            })
        }
    }
}

impl CatalogStorage for FileCatalogStorage {
    fn load(&self) -> Result<Option<String>, CatalogError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    fn save(&self, json: &str) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory catalog storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCatalogStorage {
    contents: RefCell<Option<String>>,
}

impl MemoryCatalogStorage {
    /// Create empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStorage for MemoryCatalogStorage {
    fn load(&self) -> Result<Option<String>, CatalogError> {
        Ok(self.contents.borrow().clone())
    }

    fn save(&self, json: &str) -> Result<(), CatalogError> {
        *self.contents.borrow_mut() = Some(json.to_string());
        Ok(())
    }
}

/// The set of annotation types known to the editor.
pub struct TypeCatalog {
    types: Vec<AnnotationType>,
    storage: Box<dyn CatalogStorage>,
}

impl TypeCatalog {
    /// Open the catalog from storage, falling back to the built-in types
    /// when nothing was persisted yet or the stored data is unreadable.
    pub fn open(storage: Box<dyn CatalogStorage>) -> Self {
        let types = match storage.load() {
            Ok(Some(json)) => match serde_json::from_str::<Vec<AnnotationType>>(&json) {
                Ok(types) if !types.is_empty() => {
                    log::info!("Loaded {} annotation types", types.len());
                    types
                }
                Ok(_) => default_types(),
                Err(e) => {
                    log::warn!("Failed to parse stored annotation types: {e}");
                    default_types()
                }
            },
            Ok(None) => {
                log::debug!("No stored annotation types, using defaults");
                default_types()
            }
            Err(e) => {
                log::warn!("Failed to load annotation types: {e}");
                default_types()
            }
        };
        Self { types, storage }
    }

    /// All catalog entries, defaults first in their built-in order.
    pub fn types(&self) -> &[AnnotationType] {
        &self.types
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&AnnotationType> {
        self.types.iter().find(|t| t.id == id)
    }

    /// Check whether an entry with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Marker icon for a type id, with a generic fallback for unknown ids.
    pub fn icon_for(&self, id: &str) -> &str {
        self.get(id).map(|t| t.icon.as_str()).unwrap_or(FALLBACK_TYPE_ICON)
    }

    /// Add a custom type and return its generated id.
    pub fn add_type(&mut self, name: &str, icon: &str) -> Result<String, CatalogError> {
        let name = name.trim();
        validate_type_name(name)?;

        let id = self.next_custom_id();
        self.types.push(AnnotationType::new(id.as_str(), name, icon));
        self.flush()?;
        log::info!("Added annotation type '{name}' ({id})");
        Ok(id)
    }

    /// Rename and/or re-icon an entry. Defaults can be edited, not deleted.
    pub fn update_type(
        &mut self,
        id: &str,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> Result<(), CatalogError> {
        if let Some(name) = name {
            validate_type_name(name.trim())?;
        }
        let Some(entry) = self.types.iter_mut().find(|t| t.id == id) else {
            return Err(CatalogError::NotFound { id: id.to_string() });
        };
        if let Some(name) = name {
            entry.name = name.trim().to_string();
        }
        if let Some(icon) = icon {
            entry.icon = icon.to_string();
        }
        self.flush()?;
        log::debug!("Updated annotation type {id}");
        Ok(())
    }

    /// Delete a custom type, first retyping any annotations that still use
    /// it to the fallback type.
    ///
    /// The retype runs before the entry is removed and goes through the
    /// store as a tracked mutation, so it lands in the undo history.
    /// Deleting a built-in type is refused. Returns the number of
    /// annotations that were reassigned.
    pub fn delete_type(
        &mut self,
        id: &str,
        store: &mut AnnotationStore,
    ) -> Result<usize, CatalogError> {
        let Some(entry) = self.get(id) else {
            return Err(CatalogError::NotFound { id: id.to_string() });
        };
        if entry.is_default {
            return Err(CatalogError::Forbidden { id: id.to_string() });
        }

        let reassigned = store.convert_type(id, FALLBACK_TYPE_ID);
        self.types.retain(|t| t.id != id);
        self.flush()?;
        if reassigned > 0 {
            log::info!(
                "Deleted annotation type '{id}', reassigned {reassigned} annotations to '{FALLBACK_TYPE_ID}'"
            );
        } else {
            log::info!("Deleted annotation type '{id}'");
        }
        Ok(reassigned)
    }

    fn next_custom_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut bump = millis;
        let mut candidate = format!("custom-{bump}");
        while self.contains(&candidate) {
            bump += 1;
            candidate = format!("custom-{bump}");
        }
        candidate
    }

    fn flush(&self) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(&self.types)?;
        self.storage.save(&json)
    }
}
