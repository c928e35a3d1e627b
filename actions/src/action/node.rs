//! The [`Action`] tree node.
//!
//! An action owns one [`ActionBehavior`] and an ordered list of
//! sub-actions. Insertion order is execution order: `execute_all` and
//! `redo_all` walk the node first and then its children forward,
//! `undo_all` walks the children backward and the node last.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;

use super::behavior::{ActionBehavior, ActionError, ActionResult, Editable, Group, MultiAction};
use super::progress::{Progress, ProgressReporter};
use crate::config::DetailFormat;

/// An undoable unit of work with ordered sub-actions.
///
/// Sub-actions are owned: dropping a node drops its whole subtree.
/// A sub-action that fails to execute is pruned immediately, so the
/// children of an executed node are exactly the ones that took effect.
///
/// # Example
///
/// ```ignore
/// let mut action = Action::new("Paste");
/// action.add_action(Action::with_behavior("Insert text", InsertText::new(at, text)));
/// action.add_action(Action::with_behavior("Move caret", MoveCaret::new(at + len)));
///
/// action.execute_all(&mut buffer, None)?;
/// // ...later, from the undo stack
/// action.undo_all(&mut buffer, None);
/// action.redo_all(&mut buffer, None);
/// ```
pub struct Action<T: Editable> {
    description: String,
    behavior: Box<dyn ActionBehavior<T>>,
    sub_actions: Vec<Action<T>>,
    /// Children queued through [`add_action_during_iteration`](Self::add_action_during_iteration).
    deferred: Mutex<Vec<Action<T>>>,
    detailed_description: OnceLock<String>,
    executed: bool,
    merge_disabled: bool,
    side_effects_checked: bool,
}

impl<T: Editable> Action<T> {
    /// Creates a plain container node.
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_behavior(description, Group)
    }

    /// Creates a container whose sub-actions merge pairwise with those of
    /// an equally shaped sibling.
    pub fn multi(description: impl Into<String>) -> Self {
        Self::with_behavior(description, MultiAction)
    }

    /// Creates a node driven by `behavior`.
    pub fn with_behavior(
        description: impl Into<String>,
        behavior: impl ActionBehavior<T>,
    ) -> Self {
        Self::from_boxed(description, Box::new(behavior))
    }

    /// Creates a node from an already boxed behavior.
    pub fn from_boxed(description: impl Into<String>, behavior: Box<dyn ActionBehavior<T>>) -> Self {
        Self {
            description: description.into(),
            behavior,
            sub_actions: Vec::new(),
            deferred: Mutex::new(Vec::new()),
            detailed_description: OnceLock::new(),
            executed: false,
            merge_disabled: false,
            side_effects_checked: false,
        }
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    /// Appends a sub-action, taking ownership.
    pub fn add_action(&mut self, action: Action<T>) {
        self.commit_deferred();
        self.sub_actions.push(action);
        self.invalidate_details();
    }

    /// Queues a sub-action while the children are borrowed elsewhere.
    ///
    /// Takes `&self`, so it can be called while iterating
    /// [`sub_actions`](Self::sub_actions). Queued children are appended at
    /// the next mutating call; a running `execute_all` picks them up in
    /// the same pass.
    pub fn add_action_during_iteration(&self, action: Action<T>) {
        self.deferred.lock().push(action);
    }

    /// Inserts a sub-action at `index`, clamped to the number of children.
    pub fn insert_action(&mut self, action: Action<T>, index: usize) {
        self.commit_deferred();
        let index = index.min(self.sub_actions.len());
        self.sub_actions.insert(index, action);
        self.invalidate_details();
    }

    /// Executes `action` with its whole subtree and appends it on success.
    ///
    /// A failed action is dropped and never attached.
    pub fn add_action_and_execute(&mut self, mut action: Action<T>, target: &mut T) -> ActionResult {
        if let Err(err) = action.execute_all(target, None) {
            log::debug!("Discarding sub-action \"{}\": {err}", action.description);
            return Err(err);
        }
        self.add_action(action);
        Ok(())
    }

    /// Executes `action` with its whole subtree and inserts it at `index`
    /// on success.
    pub fn insert_action_and_execute(
        &mut self,
        mut action: Action<T>,
        index: usize,
        target: &mut T,
    ) -> ActionResult {
        if let Err(err) = action.execute_all(target, None) {
            log::debug!("Discarding sub-action \"{}\": {err}", action.description);
            return Err(err);
        }
        self.insert_action(action, index);
        Ok(())
    }

    /// Detaches the sub-action at `index` and hands it back.
    pub fn remove_action(&mut self, index: usize) -> Option<Action<T>> {
        self.commit_deferred();
        if index >= self.sub_actions.len() {
            return None;
        }
        let removed = self.sub_actions.remove(index);
        self.invalidate_details();
        Some(removed)
    }

    /// Drops all sub-actions, including queued ones.
    pub fn remove_sub_actions(&mut self) {
        self.deferred.get_mut().clear();
        self.sub_actions.clear();
        self.invalidate_details();
    }

    /// Iterates over the sub-actions in execution order.
    pub fn sub_actions(&self) -> impl Iterator<Item = &Action<T>> {
        self.sub_actions.iter()
    }

    /// Returns the sub-action at `index`.
    pub fn action(&self, index: usize) -> Option<&Action<T>> {
        self.sub_actions.get(index)
    }

    /// Returns the sub-action at `index` mutably.
    pub fn action_mut(&mut self, index: usize) -> Option<&mut Action<T>> {
        self.invalidate_details();
        self.sub_actions.get_mut(index)
    }

    /// Number of attached sub-actions (queued ones are not counted).
    pub fn count_sub_actions(&self) -> usize {
        self.sub_actions.len()
    }

    pub(crate) fn commit_deferred(&mut self) {
        let deferred = self.deferred.get_mut();
        if !deferred.is_empty() {
            self.sub_actions.append(deferred);
            self.invalidate_details();
        }
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Executes this node and then its sub-actions in order.
    ///
    /// Already executed nodes are skipped. A sub-action whose subtree
    /// fails is dropped from the tree. The node succeeds if its own hook
    /// or at least one surviving sub-action succeeded; otherwise the
    /// node's own error is returned.
    pub fn execute_all(&mut self, target: &mut T, progress: Option<&mut dyn Progress>) -> ActionResult {
        let mut reporter = ProgressReporter::new(progress, self.progress_units());
        let result = self.execute_all_internal(target, &mut reporter);
        reporter.finish();
        result
    }

    fn execute_all_internal(&mut self, target: &mut T, reporter: &mut ProgressReporter<'_>) -> ActionResult {
        if self.executed {
            return Ok(());
        }

        log::trace!("Executing \"{}\"", self.description);
        let own = self.behavior.execute(target);
        let mut succeeded = own.is_ok();

        self.commit_deferred();
        let mut index = 0;
        while index < self.sub_actions.len() {
            reporter.advance(&self.sub_actions[index].description);
            match self.sub_actions[index].execute_all_internal(target, reporter) {
                Ok(()) => {
                    succeeded = true;
                    index += 1;
                }
                Err(err) => {
                    let pruned = self.sub_actions.remove(index);
                    log::warn!(
                        "Sub-action \"{}\" of \"{}\" failed and was removed: {err}",
                        pruned.description,
                        self.description
                    );
                }
            }
            self.commit_deferred();
        }
        self.invalidate_details();

        if succeeded {
            self.executed = true;
            Ok(())
        } else {
            own
        }
    }

    /// Undoes the sub-actions in reverse order, then this node.
    pub fn undo_all(&mut self, target: &mut T, progress: Option<&mut dyn Progress>) {
        let mut reporter = ProgressReporter::new(progress, self.progress_units());
        self.undo_all_internal(target, &mut reporter);
        reporter.finish();
    }

    fn undo_all_internal(&mut self, target: &mut T, reporter: &mut ProgressReporter<'_>) {
        self.commit_deferred();
        for child in self.sub_actions.iter_mut().rev() {
            reporter.advance(&child.description);
            child.undo_all_internal(target, reporter);
        }
        log::trace!("Undoing \"{}\"", self.description);
        let result = self.behavior.undo(target);
        self.report_hook_failure("undo", result);
    }

    /// Redoes this node, then the sub-actions in order.
    pub fn redo_all(&mut self, target: &mut T, progress: Option<&mut dyn Progress>) {
        let mut reporter = ProgressReporter::new(progress, self.progress_units());
        self.redo_all_internal(target, &mut reporter);
        reporter.finish();
    }

    fn redo_all_internal(&mut self, target: &mut T, reporter: &mut ProgressReporter<'_>) {
        self.commit_deferred();
        log::trace!("Redoing \"{}\"", self.description);
        let result = self.behavior.redo(target);
        self.report_hook_failure("redo", result);
        for child in self.sub_actions.iter_mut() {
            reporter.advance(&child.description);
            child.redo_all_internal(target, reporter);
        }
    }

    fn report_hook_failure(&self, hook: &str, result: ActionResult) {
        match result {
            Ok(()) | Err(ActionError::NoEffect) => {}
            Err(err) => log::warn!("{hook} of \"{}\" failed: {err}", self.description),
        }
    }

    /// Number of sub-actions in the whole subtree.
    fn progress_units(&self) -> usize {
        self.sub_actions
            .iter()
            .map(|child| 1 + child.progress_units())
            .sum()
    }

    /// Notifies this node and every sub-action of an external manipulation.
    pub fn on_manipulation(&mut self, target: &mut T) {
        self.behavior.on_manipulation(target);
        for child in &mut self.sub_actions {
            child.on_manipulation(target);
        }
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Whether this node has executed successfully at least once.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Overrides the executed flag, for containers restoring history.
    pub fn set_executed(&mut self, executed: bool) {
        self.executed = executed;
    }

    /// Whether merging was explicitly disabled on this node.
    pub fn is_merge_disabled(&self) -> bool {
        self.merge_disabled
    }

    /// Opts this node in or out of merging.
    pub fn set_merge_disabled(&mut self, disabled: bool) {
        self.merge_disabled = disabled;
    }

    /// Whether the side-effect registry already extended this node.
    pub fn is_side_effects_checked(&self) -> bool {
        self.side_effects_checked
    }

    pub fn set_side_effects_checked(&mut self, checked: bool) {
        self.side_effects_checked = checked;
    }

    /// Whether the side-effect registry may extend this node.
    pub fn can_have_side_effects(&self) -> bool {
        self.behavior.can_have_side_effects()
    }

    pub fn is_draggable(&self) -> bool {
        self.behavior.is_draggable()
    }

    pub fn icon(&self) -> Option<&str> {
        self.behavior.icon()
    }

    pub fn drag_payload(&self) -> Option<Box<dyn Any + Send>> {
        self.behavior.drag_payload()
    }

    // ------------------------------------------------------------------
    // Behavior access
    // ------------------------------------------------------------------

    /// The behavior driving this node.
    pub fn behavior(&self) -> &dyn ActionBehavior<T> {
        &*self.behavior
    }

    /// Downcasts the behavior to `B`.
    pub fn behavior_as<B: ActionBehavior<T>>(&self) -> Option<&B> {
        (*self.behavior).as_any().downcast_ref::<B>()
    }

    /// Downcasts the behavior to `B` mutably.
    pub fn behavior_as_mut<B: ActionBehavior<T>>(&mut self) -> Option<&mut B> {
        self.invalidate_details();
        (*self.behavior).as_any_mut().downcast_mut::<B>()
    }

    /// Runtime kind of this node, used to pair merge candidates.
    pub fn kind(&self) -> TypeId {
        (*self.behavior).as_any().type_id()
    }

    /// Swaps the behavior out, leaving an inert [`Group`] in its place.
    pub(crate) fn take_behavior(&mut self) -> Box<dyn ActionBehavior<T>> {
        std::mem::replace(&mut self.behavior, Box::new(Group))
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut dyn ActionBehavior<T> {
        &mut *self.behavior
    }

    pub(crate) fn set_behavior(&mut self, behavior: Box<dyn ActionBehavior<T>>) {
        self.behavior = behavior;
    }

    pub(crate) fn sub_actions_mut(&mut self) -> &mut Vec<Action<T>> {
        self.commit_deferred();
        self.invalidate_details();
        &mut self.sub_actions
    }

    // ------------------------------------------------------------------
    // Descriptions
    // ------------------------------------------------------------------

    /// Label shown in undo menus.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Adopts the first non-empty sub-action description if this node
    /// has none.
    ///
    /// Multi-action children without a description derive theirs first.
    pub fn take_description_from_sub_action(&mut self) {
        if !self.description.is_empty() {
            return;
        }
        for child in &mut self.sub_actions {
            if child.description.is_empty() && child.behavior.can_merge_sub_actions() {
                child.take_description_from_sub_action();
            }
            if !child.description.is_empty() {
                self.description = child.description.clone();
                return;
            }
        }
    }

    /// Summary of this node's effects, built on first access.
    ///
    /// Uses the default [`DetailFormat`]: up to four distinct sub-action
    /// details joined with `", "`, followed by `", ..."` when more exist.
    pub fn detailed_description(&self) -> &str {
        self.detailed_description
            .get_or_init(|| self.describe_details(&DetailFormat::default()))
    }

    /// Builds the detailed description with a custom format. Not cached.
    pub fn detailed_description_with(&self, format: &DetailFormat) -> String {
        self.describe_details(format)
    }

    fn describe_details(&self, format: &DetailFormat) -> String {
        if let Some(details) = self.behavior.describe_details() {
            return details;
        }

        let mut details = String::new();
        let mut entries = 0;
        let mut previous: Option<&str> = None;
        for child in &self.sub_actions {
            let detail = child.detailed_description();
            if detail.is_empty() || previous == Some(detail) {
                continue;
            }
            if entries == format.max_entries {
                if !details.is_empty() {
                    details.push_str(&format.separator);
                }
                details.push_str(&format.ellipsis);
                return details;
            }
            if !details.is_empty() {
                details.push_str(&format.separator);
            }
            details.push_str(detail);
            entries += 1;
            previous = Some(detail);
        }
        details
    }

    pub(crate) fn invalidate_details(&mut self) {
        self.detailed_description.take();
    }
}

impl<T: Editable> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("description", &self.description)
            .field("behavior", &self.behavior)
            .field("sub_actions", &self.sub_actions)
            .field("executed", &self.executed)
            .field("merge_disabled", &self.merge_disabled)
            .field("side_effects_checked", &self.side_effects_checked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Journal {
        value: i32,
        calls: Vec<String>,
    }

    impl Editable for Journal {}

    #[derive(Debug)]
    struct Step {
        name: &'static str,
        amount: i32,
    }

    impl ActionBehavior<Journal> for Step {
        fn execute(&mut self, target: &mut Journal) -> ActionResult {
            target.value += self.amount;
            target.calls.push(format!("execute {}", self.name));
            Ok(())
        }

        fn undo(&mut self, target: &mut Journal) -> ActionResult {
            target.value -= self.amount;
            target.calls.push(format!("undo {}", self.name));
            Ok(())
        }

        fn redo(&mut self, target: &mut Journal) -> ActionResult {
            target.value += self.amount;
            target.calls.push(format!("redo {}", self.name));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Fail;

    impl ActionBehavior<Journal> for Fail {
        fn execute(&mut self, _target: &mut Journal) -> ActionResult {
            Err(ActionError::InvalidState("locked".into()))
        }
    }

    #[derive(Debug)]
    struct Detail(&'static str);

    impl ActionBehavior<Journal> for Detail {
        fn execute(&mut self, _target: &mut Journal) -> ActionResult {
            Ok(())
        }

        fn describe_details(&self) -> Option<String> {
            Some(self.0.to_owned())
        }
    }

    fn step(name: &'static str, amount: i32) -> Action<Journal> {
        Action::with_behavior(name, Step { name, amount })
    }

    #[test]
    fn execute_visits_node_then_children() {
        let mut journal = Journal::default();
        let mut root = step("root", 1);
        root.add_action(step("a", 10));
        root.add_action(step("b", 100));

        root.execute_all(&mut journal, None).unwrap();
        assert_eq!(journal.calls, ["execute root", "execute a", "execute b"]);
        assert_eq!(journal.value, 111);
        assert!(root.is_executed());
        assert!(root.action(0).unwrap().is_executed());
    }

    #[test]
    fn undo_and_redo_orders() {
        let mut journal = Journal::default();
        let mut root = step("root", 1);
        root.add_action(step("a", 10));
        root.add_action(step("b", 100));
        root.execute_all(&mut journal, None).unwrap();
        journal.calls.clear();

        root.undo_all(&mut journal, None);
        assert_eq!(journal.calls, ["undo b", "undo a", "undo root"]);
        assert_eq!(journal.value, 0);
        journal.calls.clear();

        root.redo_all(&mut journal, None);
        assert_eq!(journal.calls, ["redo root", "redo a", "redo b"]);
        assert_eq!(journal.value, 111);
    }

    #[test]
    fn second_execute_is_noop() {
        let mut journal = Journal::default();
        let mut root = step("root", 1);
        root.execute_all(&mut journal, None).unwrap();
        root.execute_all(&mut journal, None).unwrap();
        assert_eq!(journal.value, 1);
    }

    #[test]
    fn failing_child_is_pruned() {
        let mut journal = Journal::default();
        let mut root = Action::new("group");
        root.add_action(step("a", 1));
        root.add_action(Action::with_behavior("broken", Fail));
        root.add_action(step("b", 2));

        root.execute_all(&mut journal, None).unwrap();
        assert_eq!(root.count_sub_actions(), 2);
        assert_eq!(root.action(1).unwrap().description(), "b");
    }

    #[test]
    fn empty_group_fails_with_no_effect() {
        let mut journal = Journal::default();
        let mut root = Action::new("group");
        root.add_action(Action::with_behavior("broken", Fail));

        assert_eq!(root.execute_all(&mut journal, None), Err(ActionError::NoEffect));
        assert!(!root.is_executed());
        assert_eq!(root.count_sub_actions(), 0);
    }

    #[test]
    fn failing_node_survives_through_children() {
        let mut journal = Journal::default();
        let mut root = Action::with_behavior("broken", Fail);
        root.add_action(step("a", 1));
        assert!(root.execute_all(&mut journal, None).is_ok());
        assert!(root.is_executed());
    }

    #[test]
    fn add_action_and_execute_discards_failures() {
        let mut journal = Journal::default();
        let mut root = Action::new("group");
        root.add_action_and_execute(step("a", 5), &mut journal).unwrap();
        assert!(root.add_action_and_execute(Action::with_behavior("broken", Fail), &mut journal).is_err());
        assert_eq!(root.count_sub_actions(), 1);
        assert!(root.action(0).unwrap().is_executed());
        assert_eq!(journal.value, 5);
    }

    #[test]
    fn insert_action_and_execute_positions_child() {
        let mut journal = Journal::default();
        let mut root = Action::new("group");
        root.add_action(step("a", 1));
        root.insert_action_and_execute(step("b", 2), 0, &mut journal).unwrap();
        assert_eq!(root.action(0).unwrap().description(), "b");
        assert_eq!(journal.calls, ["execute b"]);
    }

    #[test]
    fn insert_clamps_index() {
        let mut root: Action<Journal> = Action::new("group");
        root.insert_action(step("a", 1), 10);
        root.insert_action(step("b", 1), 0);
        let names: Vec<_> = root.sub_actions().map(Action::description).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn remove_action_hands_back_child() {
        let mut root: Action<Journal> = Action::new("group");
        root.add_action(step("a", 1));
        root.add_action(step("b", 1));
        let removed = root.remove_action(0).unwrap();
        assert_eq!(removed.description(), "a");
        assert!(root.remove_action(5).is_none());
        root.remove_sub_actions();
        assert_eq!(root.count_sub_actions(), 0);
    }

    #[test]
    fn deferred_children_join_the_running_pass() {
        let mut journal = Journal::default();
        let mut root = Action::new("group");
        root.add_action(step("a", 1));
        for _child in root.sub_actions() {
            root.add_action_during_iteration(step("late", 2));
        }
        assert_eq!(root.count_sub_actions(), 1);

        root.execute_all(&mut journal, None).unwrap();
        assert_eq!(root.count_sub_actions(), 2);
        assert_eq!(journal.calls, ["execute a", "execute late"]);
    }

    #[test]
    fn description_taken_from_first_described_child() {
        let mut root: Action<Journal> = Action::new("");
        root.add_action(Action::new(""));
        root.add_action(step("second", 1));
        root.take_description_from_sub_action();
        assert_eq!(root.description(), "second");
    }

    #[test]
    fn description_recurses_into_multi_children() {
        let mut inner: Action<Journal> = Action::multi("");
        inner.add_action(step("nested", 1));
        let mut root = Action::new("");
        root.add_action(inner);
        root.add_action(step("second", 1));
        root.take_description_from_sub_action();
        assert_eq!(root.description(), "nested");
        assert_eq!(root.action(0).unwrap().description(), "nested");
    }

    #[test]
    fn existing_description_is_kept() {
        let mut root: Action<Journal> = Action::new("mine");
        root.add_action(step("child", 1));
        root.take_description_from_sub_action();
        assert_eq!(root.description(), "mine");
    }

    #[test]
    fn detailed_description_skips_consecutive_duplicates() {
        let mut root: Action<Journal> = Action::new("group");
        for detail in ["A", "A", "", "B", "A"] {
            root.add_action(Action::with_behavior("", Detail(detail)));
        }
        assert_eq!(root.detailed_description(), "A, B, A");
    }

    #[test]
    fn detailed_description_truncates() {
        let mut root: Action<Journal> = Action::new("group");
        for detail in ["A", "B", "C", "D", "E", "F"] {
            root.add_action(Action::with_behavior("", Detail(detail)));
        }
        assert_eq!(root.detailed_description(), "A, B, C, D, ...");
    }

    #[test]
    fn detailed_description_refreshes_after_mutation() {
        let mut root: Action<Journal> = Action::new("group");
        root.add_action(Action::with_behavior("", Detail("A")));
        assert_eq!(root.detailed_description(), "A");
        root.add_action(Action::with_behavior("", Detail("B")));
        assert_eq!(root.detailed_description(), "A, B");
    }

    #[test]
    fn detailed_description_with_custom_format() {
        let mut root: Action<Journal> = Action::new("group");
        for detail in ["A", "B", "C"] {
            root.add_action(Action::with_behavior("", Detail(detail)));
        }
        let format = DetailFormat {
            max_entries: 2,
            separator: " | ".into(),
            ellipsis: "…".into(),
        };
        assert_eq!(root.detailed_description_with(&format), "A | B | …");
    }

    #[test]
    fn behavior_downcast() {
        let mut action = step("a", 3);
        assert_eq!(action.behavior_as::<Step>().unwrap().amount, 3);
        action.behavior_as_mut::<Step>().unwrap().amount = 4;
        assert_eq!(action.behavior_as::<Step>().unwrap().amount, 4);
        assert!(action.behavior_as::<Fail>().is_none());
        assert_eq!(action.kind(), TypeId::of::<Step>());
    }

    #[derive(Debug)]
    struct Watcher {
        name: &'static str,
    }

    impl ActionBehavior<Journal> for Watcher {
        fn execute(&mut self, _target: &mut Journal) -> ActionResult {
            Ok(())
        }

        fn on_manipulation(&mut self, target: &mut Journal) {
            target.calls.push(format!("manipulated {}", self.name));
        }
    }

    #[test]
    fn manipulation_reaches_every_node() {
        let mut journal = Journal::default();
        let mut root = Action::with_behavior("root", Watcher { name: "root" });
        root.add_action(Action::with_behavior("child", Watcher { name: "child" }));
        root.on_manipulation(&mut journal);
        assert_eq!(journal.calls, ["manipulated root", "manipulated child"]);
    }
}
