//! Undoable action trees.
//!
//! - [`Editable`] — marker trait for types that can be edited
//! - [`ActionBehavior`] — the hooks of one kind of action
//! - [`Action`] — tree node driving execute/undo/redo over its sub-actions
//! - [`MultiAction`] — container behavior whose children merge pairwise
//! - [`RestorePointAction`] — history checkpoint holding shared redo entries
//! - [`Progress`] — host-side receiver of progress updates
//!
//! # Ordering
//!
//! `execute_all` and `redo_all` run a node before its children and the
//! children in insertion order. `undo_all` runs the children in reverse
//! and the node last, so later edits are unwound before earlier ones.
//!
//! # Failures
//!
//! A sub-action whose subtree fails to execute is dropped on the spot and
//! never appears in history. Undo and redo are not expected to fail;
//! errors from those hooks are logged and the walk continues.

mod behavior;
mod merge;
mod node;
mod progress;
mod restore_point;

pub use behavior::{ActionBehavior, ActionError, ActionResult, AsAny, Editable, Group, MultiAction};
pub use node::Action;
pub use progress::{LogProgress, Progress};
pub use restore_point::{EditTime, RestorePointAction, SharedAction};
