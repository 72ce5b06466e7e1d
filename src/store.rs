//! Working state for the currently open map.
//!
//! [`AnnotationStore`] owns the annotation collection of one open map, the
//! ephemeral UI state that sits beside it (selection, form mode), and the
//! undo history layered on top. It is a plain value with no ambient
//! globals: construct one per session and hand it to UI callers.
//!
//! Tracked mutations (add / update / remove / convert_type) snapshot the
//! collection into the history before applying. Loading or clearing a map
//! is a context switch, not an edit: both reset the history. Selection and
//! form changes are never tracked.

use thiserror::Error;

use crate::model::{Annotation, AnnotationPatch, MapData, ValidationError};
use crate::undo::{UndoConfig, UndoStack};

/// Errors from collection mutations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Field constraints rejected the input before anything changed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An annotation with this id is already in the collection
    #[error("annotation {id} already exists")]
    DuplicateId { id: String },
}

/// Identity of the currently open map.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMap {
    pub id: String,
    pub name: String,
    pub image_path: String,
}

/// Which editing form is open, if any. Ephemeral: never versioned, never
/// restored by undo/redo.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormState {
    /// No form open
    #[default]
    Closed,
    /// Creating a new annotation at a clicked map position
    Create { x: f64, y: f64 },
    /// Editing an existing annotation
    Edit { id: String },
}

/// Session state for the currently open map.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    open_map: Option<OpenMap>,
    annotations: Vec<Annotation>,
    selected: Option<String>,
    form: FormState,
    history: UndoStack,
}

impl AnnotationStore {
    /// Create an empty session with no open map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a custom undo depth.
    pub fn with_undo_config(config: UndoConfig) -> Self {
        Self {
            history: UndoStack::with_config(config),
            ..Default::default()
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Identity of the open map, if any.
    pub fn open_map(&self) -> Option<&OpenMap> {
        self.open_map.as_ref()
    }

    /// The working annotation collection.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Look up an annotation by id.
    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Number of annotations in the collection.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Currently selected annotation id.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Current form state.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// The undo/redo history.
    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Open a map, replacing the entire working collection. Clears the
    /// selection, closes any open form, and resets the history.
    pub fn load_map(&mut self, map: MapData) {
        log::info!(
            "Opened map '{}' with {} annotations",
            map.name,
            map.annotations.len()
        );
        self.open_map = Some(OpenMap {
            id: map.id,
            name: map.name,
            image_path: map.image_path,
        });
        self.annotations = map.annotations;
        self.selected = None;
        self.form = FormState::Closed;
        self.history.clear();
    }

    /// Close the session, emptying the collection and all UI state.
    /// Used when returning to the map list.
    pub fn clear_map(&mut self) {
        self.open_map = None;
        self.annotations.clear();
        self.selected = None;
        self.form = FormState::Closed;
        self.history.clear();
    }

    // ========================================================================
    // Tracked mutations
    // ========================================================================

    /// Add a fully-formed annotation to the collection.
    ///
    /// The annotation's id must not collide with an existing one. Title and
    /// description are stored trimmed.
    pub fn add(&mut self, mut annotation: Annotation) -> Result<(), StoreError> {
        annotation.title = annotation.title.trim().to_string();
        annotation.description = annotation.description.trim().to_string();
        annotation.validate()?;
        if self.annotations.iter().any(|a| a.id == annotation.id) {
            return Err(StoreError::DuplicateId { id: annotation.id });
        }

        self.history.record(self.annotations.clone());
        log::debug!("Added annotation {} ('{}')", annotation.id, annotation.title);
        self.annotations.push(annotation);
        Ok(())
    }

    /// Merge a patch into the annotation matching `id`.
    ///
    /// Only `type`, `x`, `y`, `title` and `description` can change; the id
    /// is immutable. An unknown id is a logged no-op, reported as
    /// `Ok(false)`.
    pub fn update(&mut self, id: &str, mut patch: AnnotationPatch) -> Result<bool, StoreError> {
        if let Some(title) = patch.title.as_mut() {
            *title = title.trim().to_string();
        }
        if let Some(description) = patch.description.as_mut() {
            *description = description.trim().to_string();
        }
        patch.validate()?;

        let Some(index) = self.annotations.iter().position(|a| a.id == id) else {
            log::warn!("Update ignored: no annotation with id {id}");
            return Ok(false);
        };

        self.history.record(self.annotations.clone());
        patch.apply(&mut self.annotations[index]);
        log::debug!("Updated annotation {id}");
        Ok(true)
    }

    /// Remove the annotation matching `id`. Clears the selection and closes
    /// the form if they referred to it. An unknown id is a logged no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.annotations.iter().position(|a| a.id == id) else {
            log::warn!("Remove ignored: no annotation with id {id}");
            return false;
        };

        self.history.record(self.annotations.clone());
        let removed = self.annotations.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if matches!(&self.form, FormState::Edit { id: editing } if editing.as_str() == id) {
            self.form = FormState::Closed;
        }
        log::debug!("Removed annotation {} ('{}')", removed.id, removed.title);
        true
    }

    /// Reassign every annotation of type `from` to type `to`. Atomic: all
    /// matching annotations change, under a single history entry. Returns
    /// the number of annotations retyped; zero matches record no history.
    pub fn convert_type(&mut self, from: &str, to: &str) -> usize {
        let matching = self
            .annotations
            .iter()
            .filter(|a| a.type_id == from)
            .count();
        if matching == 0 {
            return 0;
        }

        self.history.record(self.annotations.clone());
        for annotation in self.annotations.iter_mut().filter(|a| a.type_id == from) {
            annotation.type_id = to.to_string();
        }
        log::debug!("Retyped {matching} annotations from '{from}' to '{to}'");
        matching
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Restore the collection to its state before the last tracked
    /// mutation. Selection and form state are untouched. Returns false if
    /// there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.annotations)
    }

    /// Re-apply the last undone mutation. Returns false if there was
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.annotations)
    }

    // ========================================================================
    // Ephemeral UI state
    // ========================================================================

    /// Select an annotation, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<&str>) {
        self.selected = id.map(String::from);
    }

    /// Open the creation form for a clicked map position.
    pub fn open_create_form(&mut self, x: f64, y: f64) {
        self.form = FormState::Create { x, y };
        self.selected = None;
    }

    /// Open the edit form for an existing annotation.
    pub fn open_edit_form(&mut self, id: &str) {
        self.selected = Some(id.to_string());
        self.form = FormState::Edit { id: id.to_string() };
    }

    /// Close whichever form is open.
    pub fn close_form(&mut self) {
        self.form = FormState::Closed;
    }

    // ========================================================================
    // Save-time bookkeeping
    // ========================================================================

    /// Replace provisional client-generated ids with the ids the server
    /// assigned during a save. Follows the selection and edit form to the
    /// new id. Not a tracked mutation.
    pub(crate) fn adopt_server_ids(&mut self, remaps: &[(String, String)]) {
        for (provisional, assigned) in remaps {
            if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == *provisional) {
                annotation.id = assigned.clone();
            }
            if self.selected.as_deref() == Some(provisional.as_str()) {
                self.selected = Some(assigned.clone());
            }
            if let FormState::Edit { id } = &mut self.form {
                if id == provisional {
                    *id = assigned.clone();
                }
            }
        }
        if !remaps.is_empty() {
            log::debug!("Adopted {} server-assigned annotation ids", remaps.len());
        }
    }
}
