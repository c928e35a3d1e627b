//! Side effects: consequential actions attached after the fact.
//!
//! A [`SideEffect`] looks at an action that was just performed and may
//! return a new action describing a change that follows from it (e.g.
//! re-laying out a paragraph after its text changed). The
//! [`SideEffectRegistry`] consults every registered effect in order and
//! attaches the results as sub-actions, so undoing the original action
//! also undoes its consequences.
//!
//! The registry is an ordinary value owned by the host application and
//! passed to the command layer; there is no global instance.

mod registry;

pub use registry::{SideEffectRegistry, Suspender};

use crate::action::{Action, Editable};

/// A plugin producing consequential actions.
///
/// Names identify effects within a registry and must be unique.
pub trait SideEffect<T: Editable>: Send + Sync {
    /// Unique name used for ordering and suspension.
    fn name(&self) -> &str;

    /// Returns an unexecuted action following from `original`, or `None`
    /// if this effect does not apply.
    fn create_action(&self, original: &Action<T>) -> Option<Action<T>>;

    /// Like [`create_action`](Self::create_action), qualified by a
    /// caller-supplied context. Default: not applicable.
    fn create_action_in_context(&self, _original: &Action<T>, _context: &str) -> Option<Action<T>> {
        None
    }
}
