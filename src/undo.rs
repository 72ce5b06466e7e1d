//! Undo/Redo history for annotation edits.
//!
//! The history holds value snapshots of the annotation collection taken
//! immediately before each tracked mutation. Only the collection is
//! versioned: selection and form state live outside the snapshot, so
//! undoing an edit never reopens a form or changes what is selected.

use crate::model::Annotation;

/// An immutable copy of the annotation collection at one point in time.
pub type Snapshot = Vec<Annotation>;

/// Configuration for the undo stack.
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of snapshots to keep in history.
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_history: crate::constants::MAX_UNDO_HISTORY,
        }
    }
}

/// The undo/redo history stack.
///
/// Maintains two stacks:
/// - `undo_stack`: snapshots restorable by undo (most recent at the end)
/// - `redo_stack`: snapshots restorable by redo (most recent at the end)
///
/// Recording a new snapshot clears the redo stack (can't redo after a new
/// edit). Once the depth cap is reached, the oldest snapshot is evicted.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    /// Snapshots that can be restored by undo
    undo_stack: Vec<Snapshot>,
    /// Snapshots that can be restored by redo
    redo_stack: Vec<Snapshot>,
    /// Configuration
    config: UndoConfig,
}

impl UndoStack {
    /// Create a new empty undo stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration.
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record the collection state prior to a tracked mutation.
    /// This clears the redo stack.
    pub fn record(&mut self, prior: Snapshot) {
        log::debug!("📝 Undo: recorded snapshot of {} annotations", prior.len());
        self.undo_stack.push(prior);
        self.redo_stack.clear();

        // Limit history size
        while self.undo_stack.len() > self.config.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back one snapshot, trading the live collection for the most
    /// recent history entry. The live collection moves to the redo stack.
    /// Returns false if there is nothing to undo.
    pub fn undo(&mut self, current: &mut Snapshot) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            log::debug!("⏪ Undo: nothing to undo");
            return false;
        };
        let live = std::mem::replace(current, snapshot);
        self.redo_stack.push(live);
        log::debug!("⏪ Undo: restored snapshot of {} annotations", current.len());
        true
    }

    /// Step forward one snapshot. Symmetric to [`UndoStack::undo`].
    /// Returns false if there is nothing to redo.
    pub fn redo(&mut self, current: &mut Snapshot) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            log::debug!("⏩ Redo: nothing to redo");
            return false;
        };
        let live = std::mem::replace(current, snapshot);
        self.undo_stack.push(live);
        log::debug!("⏩ Redo: restored snapshot of {} annotations", current.len());
        true
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ Undo history cleared");
    }

    /// Get the number of snapshots in undo history.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of snapshots in redo history.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
