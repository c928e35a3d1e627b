//! Shared fixtures for action integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;

use redlilium_actions::{
    Action, ActionBehavior, ActionError, ActionResult, Editable, Progress, SideEffect,
};

/// Initialize logging for test output.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

// ============================================================================
// Target
// ============================================================================

/// A document that records every hook call and holds a set of toggled flags.
#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<String>,
    pub flags: BTreeSet<&'static str>,
}

impl Editable for Journal {}

// ============================================================================
// Behaviors
// ============================================================================

/// Flips one flag; execute/redo set it, undo clears it.
#[derive(Debug)]
pub struct Toggle {
    pub name: &'static str,
}

impl ActionBehavior<Journal> for Toggle {
    fn execute(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("execute {}", self.name));
        target.flags.insert(self.name);
        Ok(())
    }

    fn undo(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("undo {}", self.name));
        target.flags.remove(self.name);
        Ok(())
    }

    fn redo(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("redo {}", self.name));
        target.flags.insert(self.name);
        Ok(())
    }

    fn can_have_side_effects(&self) -> bool {
        true
    }
}

/// Always fails to execute.
#[derive(Debug)]
pub struct Refuse {
    pub name: &'static str,
}

impl ActionBehavior<Journal> for Refuse {
    fn execute(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("refuse {}", self.name));
        Err(ActionError::InvalidState(format!("{} is read-only", self.name)))
    }

    fn undo(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("undo {}", self.name));
        Ok(())
    }
}

/// Reports a fixed detailed description.
#[derive(Debug)]
pub struct Detail(pub &'static str);

impl ActionBehavior<Journal> for Detail {
    fn execute(&mut self, _target: &mut Journal) -> ActionResult {
        Ok(())
    }

    fn describe_details(&self) -> Option<String> {
        Some(self.0.to_owned())
    }
}

/// Merges with any other `Merging` by concatenating names.
#[derive(Debug)]
pub struct Merging {
    pub name: String,
}

impl ActionBehavior<Journal> for Merging {
    fn execute(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("execute {}", self.name));
        Ok(())
    }

    fn merge(
        &mut self,
        other: Box<dyn ActionBehavior<Journal>>,
    ) -> Option<Box<dyn ActionBehavior<Journal>>> {
        if let Some(other) = (*other).as_any().downcast_ref::<Merging>() {
            self.name.push_str(&other.name);
            return None;
        }
        Some(other)
    }
}

/// Never merges.
#[derive(Debug)]
pub struct Stubborn {
    pub name: &'static str,
}

impl ActionBehavior<Journal> for Stubborn {
    fn execute(&mut self, target: &mut Journal) -> ActionResult {
        target.calls.push(format!("execute {}", self.name));
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn toggle(name: &'static str) -> Action<Journal> {
    Action::with_behavior(name, Toggle { name })
}

pub fn refuse(name: &'static str) -> Action<Journal> {
    Action::with_behavior(name, Refuse { name })
}

pub fn detail(text: &'static str) -> Action<Journal> {
    Action::with_behavior("", Detail(text))
}

pub fn merging(name: &str) -> Action<Journal> {
    Action::with_behavior(
        "Merging",
        Merging {
            name: name.to_owned(),
        },
    )
}

pub fn stubborn(name: &'static str) -> Action<Journal> {
    Action::with_behavior(name, Stubborn { name })
}

// ============================================================================
// Side effects
// ============================================================================

/// Produces a toggle named after itself for every action it sees.
pub struct Follow {
    pub name: &'static str,
}

impl SideEffect<Journal> for Follow {
    fn name(&self) -> &str {
        self.name
    }

    fn create_action(&self, _original: &Action<Journal>) -> Option<Action<Journal>> {
        Some(toggle(self.name))
    }

    fn create_action_in_context(
        &self,
        _original: &Action<Journal>,
        context: &str,
    ) -> Option<Action<Journal>> {
        (context == self.name).then(|| toggle(self.name))
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Records every progress update.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub texts: Vec<String>,
    pub fractions: Vec<f32>,
}

impl Progress for RecordingProgress {
    fn set_text(&mut self, text: &str) {
        self.texts.push(text.to_owned());
    }

    fn update(&mut self, fraction: f32) {
        self.fractions.push(fraction);
    }
}
