//! Merge protocol: coalescing consecutive similar actions into one undo
//! entry.
//!
//! Leaf nodes delegate to [`ActionBehavior::merge`]. Nodes with
//! sub-actions merge only when their behavior merges sub-actions
//! (multi-actions) and every child is mergeable, since a plain node's own
//! hooks usually ignore its children and merging them would drop or
//! duplicate side effects.

use super::behavior::{ActionBehavior, Editable};
use super::node::Action;

impl<T: Editable> Action<T> {
    /// Whether this node may take part in a merge.
    pub fn can_merge(&self) -> bool {
        if self.is_merge_disabled() {
            return false;
        }
        if self.count_sub_actions() == 0 {
            return self.behavior().can_merge();
        }
        self.behavior().can_merge_sub_actions() && self.sub_actions().all(Action::can_merge)
    }

    /// Tries to merge `other` into `self`, taking ownership.
    ///
    /// Returns `None` when `other` was consumed and `Some(other)` when the
    /// two actions are incompatible; the caller then records `other` as a
    /// separate undo entry.
    ///
    /// Nodes with sub-actions require `other` to be of the same kind, with
    /// the same description and the same number of sub-actions. Children
    /// are merged pairwise: the first pair must merge or nothing happens;
    /// a later pair that does not merge has `other`'s child appended to
    /// `self` instead (executed first if `self` already ran).
    pub fn merge(&mut self, mut other: Action<T>, target: &mut T) -> Option<Action<T>> {
        self.commit_deferred();
        other.commit_deferred();
        if !self.can_merge() || !other.can_merge() {
            return Some(other);
        }

        if self.count_sub_actions() == 0 {
            if other.count_sub_actions() > 0 {
                return Some(other);
            }
            return self.merge_behavior(other);
        }

        if self.kind() != other.kind()
            || self.description() != other.description()
            || self.count_sub_actions() != other.count_sub_actions()
        {
            return Some(other);
        }

        let mut incoming = std::mem::take(other.sub_actions_mut()).into_iter();
        let Some(first) = incoming.next() else {
            return Some(other);
        };
        if let Some(rejected) = self.sub_actions_mut()[0].merge(first, target) {
            let restored = other.sub_actions_mut();
            restored.push(rejected);
            restored.extend(incoming);
            return Some(other);
        }

        for (offset, theirs) in incoming.enumerate() {
            let index = offset + 1;
            let Some(rejected) = self.sub_actions_mut()[index].merge(theirs, target) else {
                continue;
            };
            log::debug!(
                "Appending unmerged sub-action \"{}\" to \"{}\"",
                rejected.description(),
                self.description()
            );
            if self.is_executed() {
                if let Err(err) = self.add_action_and_execute(rejected, target) {
                    log::warn!("Unmerged sub-action failed to execute: {err}");
                }
            } else {
                self.add_action(rejected);
            }
        }

        log::debug!("Merged \"{}\"", self.description());
        None
    }

    fn merge_behavior(&mut self, mut other: Action<T>) -> Option<Action<T>> {
        let theirs: Box<dyn ActionBehavior<T>> = other.take_behavior();
        match self.behavior_mut().merge(theirs) {
            None => {
                log::debug!(
                    "Merged \"{}\" into \"{}\"",
                    other.description(),
                    self.description()
                );
                self.invalidate_details();
                None
            }
            Some(returned) => {
                other.set_behavior(returned);
                Some(other)
            }
        }
    }
}
