//! Editable targets and per-kind action hooks.
//!
//! This module defines the abstractions every concrete edit builds on:
//!
//! - [`Editable`] — marker trait for types that can be edited
//! - [`ActionBehavior`] — the hooks one kind of action overrides
//! - [`ActionError`] / [`ActionResult`] — error handling for hooks
//! - [`Group`] / [`MultiAction`] — behaviors for pure container nodes
//!
//! Behaviors are self-contained: each implementation stores whatever data
//! it needs (target identifiers, old/new values, etc.). The tree structure
//! itself lives in [`Action`](super::Action).

use std::any::Any;

use thiserror::Error;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. Used by
/// [`ActionBehavior::merge`] to downcast the other behavior, and by
/// [`Action::behavior_as`](super::Action::behavior_as).
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Marker trait for types that serve as editing targets.
///
/// Implement this on any document type actions operate on: a text buffer,
/// a scene graph, a spreadsheet model.
///
/// # Example
///
/// ```ignore
/// struct MyDocument { /* ... */ }
/// impl Editable for MyDocument {}
/// ```
pub trait Editable: 'static {}

/// Error type for action hook failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The target object was not found.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// The target is in an invalid state for this action.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The node has no effect of its own (pure container).
    #[error("action has no effect of its own")]
    NoEffect,
    /// A custom error with a description.
    #[error("{0}")]
    Custom(String),
}

/// Result type for action hooks.
pub type ActionResult<T = ()> = Result<T, ActionError>;

/// Per-kind hooks of an undoable action (Command pattern).
///
/// An [`Action`](super::Action) node owns one boxed behavior plus its
/// ordered sub-actions. The node drives the recursion; the behavior only
/// describes what *this* node does on its own.
///
/// Only [`execute`](Self::execute) is required. [`undo`](Self::undo) and
/// [`redo`](Self::redo) default to re-executing, which suits behaviors that
/// are idempotently re-appliable (e.g. "set value to X" with the old value
/// captured elsewhere).
///
/// # Merging
///
/// Leaf behaviors that represent incremental changes (each keystroke of
/// a typing burst) can override [`merge`](Self::merge) so that consecutive
/// actions coalesce into one undo step. Use [`AsAny::as_any`] on the
/// `other` behavior to downcast it to the concrete type.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct InsertText {
///     at: usize,
///     text: String,
/// }
///
/// impl ActionBehavior<Buffer> for InsertText {
///     fn execute(&mut self, target: &mut Buffer) -> ActionResult {
///         target.insert(self.at, &self.text);
///         Ok(())
///     }
///
///     fn undo(&mut self, target: &mut Buffer) -> ActionResult {
///         target.remove(self.at, self.text.len());
///         Ok(())
///     }
///
///     fn merge(
///         &mut self,
///         other: Box<dyn ActionBehavior<Buffer>>,
///     ) -> Option<Box<dyn ActionBehavior<Buffer>>> {
///         if let Some(other) = (*other).as_any().downcast_ref::<InsertText>() {
///             if other.at == self.at + self.text.len() {
///                 self.text.push_str(&other.text);
///                 return None; // consumed
///             }
///         }
///         Some(other) // not mergeable
///     }
/// }
/// ```
pub trait ActionBehavior<T: Editable>: std::fmt::Debug + AsAny + Send {
    /// Applies this node's own effect to the target.
    ///
    /// Returning an error marks this node as failed; the node still
    /// succeeds overall if at least one of its sub-actions succeeds.
    fn execute(&mut self, target: &mut T) -> ActionResult;

    /// Reverses this node's own effect. Defaults to re-executing.
    fn undo(&mut self, target: &mut T) -> ActionResult {
        self.execute(target)
    }

    /// Re-applies this node's own effect. Defaults to re-executing.
    fn redo(&mut self, target: &mut T) -> ActionResult {
        self.execute(target)
    }

    /// Tries to merge `other` into `self`, taking ownership.
    ///
    /// Only consulted for leaf nodes. Returns `None` when `other` was
    /// absorbed, `Some(other)` otherwise. Default: no merging.
    fn merge(&mut self, other: Box<dyn ActionBehavior<T>>) -> Option<Box<dyn ActionBehavior<T>>> {
        Some(other)
    }

    /// Whether a leaf node with this behavior may take part in merging.
    fn can_merge(&self) -> bool {
        true
    }

    /// Whether the node's sub-actions are merged pairwise with those of
    /// a sibling of the same kind. Only [`MultiAction`] enables this by
    /// default.
    fn can_merge_sub_actions(&self) -> bool {
        false
    }

    /// Whether the side-effect registry may extend this node.
    fn can_have_side_effects(&self) -> bool {
        false
    }

    /// Detailed description of this node's own effect.
    ///
    /// `None` (the default) derives the detail from the sub-actions.
    fn describe_details(&self) -> Option<String> {
        None
    }

    /// Called when the target was manipulated externally.
    fn on_manipulation(&mut self, _target: &mut T) {}

    /// Whether the action can be dragged out of a history view.
    fn is_draggable(&self) -> bool {
        false
    }

    /// Icon name for history views.
    fn icon(&self) -> Option<&str> {
        None
    }

    /// Payload handed to a drag-and-drop operation.
    fn drag_payload(&self) -> Option<Box<dyn Any + Send>> {
        None
    }
}

/// Behavior of a plain container node.
///
/// Has no effect of its own; the node succeeds only through its
/// sub-actions and never merges once it has any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Group;

impl<T: Editable> ActionBehavior<T> for Group {
    fn execute(&mut self, _target: &mut T) -> ActionResult {
        Err(ActionError::NoEffect)
    }
}

/// Behavior of a node whose sub-actions form one logical edit.
///
/// Two multi-actions with the same description and the same number of
/// sub-actions merge child by child.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiAction;

impl<T: Editable> ActionBehavior<T> for MultiAction {
    fn execute(&mut self, _target: &mut T) -> ActionResult {
        Err(ActionError::NoEffect)
    }

    fn can_merge_sub_actions(&self) -> bool {
        true
    }
}
