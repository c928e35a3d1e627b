//! Restore points: history checkpoints that park the pending redo stack.
//!
//! A [`RestorePointAction`] sits in the undo history as a marker. When it
//! is created the undo-stack container hands it the current redo entries
//! ([`save_redo`](RestorePointAction::save_redo)) and clears its own redo
//! stack; returning to the checkpoint hands them back
//! ([`restore_redo`](RestorePointAction::restore_redo)). The entries are
//! shared handles, so the redo actions themselves are never copied.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::behavior::{ActionBehavior, ActionResult, Editable};
use super::node::Action;

/// Shared handle to an action owned by an undo/redo stack.
pub type SharedAction<T> = Arc<Mutex<Action<T>>>;

/// Opaque document timestamp recorded with a restore point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditTime(pub u64);

/// Behavior of a restore-point node.
///
/// Must never be executed, undone or redone. Doing so is a programming
/// error caught by a debug assertion; release builds log it and report
/// success so the surrounding history stays consistent.
pub struct RestorePointAction<T: Editable> {
    saved_redo_stack: Vec<SharedAction<T>>,
    saved_edit_time: EditTime,
}

impl<T: Editable> RestorePointAction<T> {
    pub fn new(saved_edit_time: EditTime) -> Self {
        Self {
            saved_redo_stack: Vec::new(),
            saved_edit_time,
        }
    }

    /// Document timestamp at the moment the checkpoint was taken.
    pub fn saved_edit_time(&self) -> EditTime {
        self.saved_edit_time
    }

    /// Number of redo entries currently parked here.
    pub fn saved_redo_count(&self) -> usize {
        self.saved_redo_stack.len()
    }

    /// Shares every entry of `redo_stack`, keeping its order.
    ///
    /// The caller clears its own redo stack afterwards.
    ///
    /// # Panics
    ///
    /// Panics if entries from an earlier save were never restored.
    pub fn save_redo(&mut self, redo_stack: &[SharedAction<T>]) {
        assert!(
            self.saved_redo_stack.is_empty(),
            "restore point already holds {} saved redo entries",
            self.saved_redo_stack.len()
        );
        self.saved_redo_stack.extend(redo_stack.iter().cloned());
        log::debug!("Restore point saved {} redo entries", redo_stack.len());
    }

    /// Appends the parked entries to `redo_stack` and forgets them.
    pub fn restore_redo(&mut self, redo_stack: &mut Vec<SharedAction<T>>) {
        log::debug!(
            "Restore point restoring {} redo entries",
            self.saved_redo_stack.len()
        );
        redo_stack.append(&mut self.saved_redo_stack);
    }
}

impl<T: Editable> ActionBehavior<T> for RestorePointAction<T> {
    fn execute(&mut self, _target: &mut T) -> ActionResult {
        debug_assert!(false, "restore point actions must never be executed");
        log::error!("Restore point action was executed");
        Ok(())
    }

    fn can_merge(&self) -> bool {
        false
    }
}

impl<T: Editable> fmt::Debug for RestorePointAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestorePointAction")
            .field("saved_redo_count", &self.saved_redo_stack.len())
            .field("saved_edit_time", &self.saved_edit_time)
            .finish()
    }
}

impl<T: Editable> Action<T> {
    /// Creates a restore-point node for the history at `edit_time`.
    ///
    /// Access the checkpoint through
    /// `behavior_as_mut::<RestorePointAction<T>>()`.
    pub fn restore_point(edit_time: EditTime) -> Self {
        let mut action = Self::with_behavior("", RestorePointAction::new(edit_time));
        action.set_merge_disabled(true);
        action
    }
}
