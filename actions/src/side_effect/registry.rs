//! Ordered side-effect registry and scoped suspension.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use super::SideEffect;
use crate::action::{Action, Editable};
use crate::config::SideEffectsConfig;

struct Registered<T: Editable> {
    effect: Box<dyn SideEffect<T>>,
    suspended: AtomicBool,
}

/// Ordered list of [`SideEffect`]s.
///
/// Effects run in registration order: each one sees the original action
/// and its result is appended after those of earlier effects.
///
/// # Example
///
/// ```ignore
/// let mut registry = SideEffectRegistry::new();
/// registry.register_side_effect(Relayout);
/// registry.register_side_effect_before(UpdateIndex, "relayout");
///
/// action.execute_all(&mut doc, None)?;
/// registry.extend_action(&mut action, &mut doc, None);
/// ```
pub struct SideEffectRegistry<T: Editable> {
    effects: Vec<Registered<T>>,
    config: SideEffectsConfig,
}

impl<T: Editable> SideEffectRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::with_config(SideEffectsConfig::default())
    }

    /// Creates an empty registry; effects named in
    /// [`SideEffectsConfig::suspended`] start suspended when they register.
    pub fn with_config(config: SideEffectsConfig) -> Self {
        Self {
            effects: Vec::new(),
            config,
        }
    }

    /// Appends `effect`; it runs after every effect registered so far.
    pub fn register_side_effect(&mut self, effect: impl SideEffect<T> + 'static) {
        let index = self.effects.len();
        self.insert(effect, index);
    }

    /// Inserts `effect` right before the effect named `other`, or appends
    /// it if there is no such effect.
    pub fn register_side_effect_before(&mut self, effect: impl SideEffect<T> + 'static, other: &str) {
        let index = self.position(other).unwrap_or(self.effects.len());
        self.insert(effect, index);
    }

    fn insert(&mut self, effect: impl SideEffect<T> + 'static, index: usize) {
        let name = effect.name();
        debug_assert!(
            self.position(name).is_none(),
            "side effect \"{name}\" registered twice"
        );
        let suspended = self.config.suspended.iter().any(|s| s == name);
        log::info!(
            "Registered side effect \"{name}\" at position {index}{}",
            if suspended { " (suspended)" } else { "" }
        );
        self.effects.insert(
            index,
            Registered {
                effect: Box::new(effect),
                suspended: AtomicBool::new(suspended),
            },
        );
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.effects.iter().position(|r| r.effect.name() == name)
    }

    /// Looks an effect up by name.
    pub fn get_side_effect(&self, name: &str) -> Option<&dyn SideEffect<T>> {
        self.position(name).map(|i| &*self.effects[i].effect)
    }

    /// Whether the named effect is currently suspended. Unknown names are
    /// never suspended.
    pub fn is_suspended(&self, name: &str) -> bool {
        self.position(name)
            .is_some_and(|i| self.effects[i].suspended.load(Ordering::Relaxed))
    }

    /// Suspends or resumes the named effect. Returns `false` if no effect
    /// has that name.
    pub fn set_suspended(&self, name: &str, suspended: bool) -> bool {
        match self.position(name) {
            Some(i) => {
                self.effects[i].suspended.store(suspended, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Suspends the named effect until the returned guard is dropped.
    pub fn suspend(&self, name: &str) -> Suspender<'_, T> {
        Suspender::new(self, name)
    }

    /// Effect names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().map(|r| r.effect.name())
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Lets every active effect extend `original` with sub-actions.
    ///
    /// Returns `true` if at least one sub-action was attached, or if the
    /// action was already extended earlier (which is not repeated).
    /// Actions that cannot have side effects are left untouched.
    ///
    /// When `original` has already executed, new side-effect actions are
    /// executed before being attached; otherwise they are attached as-is
    /// and run with the rest of the tree.
    pub fn extend_action(&self, original: &mut Action<T>, target: &mut T, context: Option<&str>) -> bool {
        if !original.can_have_side_effects() {
            return false;
        }
        if original.is_side_effects_checked() {
            return true;
        }

        let mut attached = false;
        for registered in &self.effects {
            if registered.suspended.load(Ordering::Relaxed) {
                continue;
            }
            let effect = &registered.effect;
            let created = match context {
                Some(context) => effect.create_action_in_context(original, context),
                None => effect.create_action(original),
            };
            let Some(action) = created else {
                continue;
            };

            log::debug!(
                "Side effect \"{}\" extends \"{}\" with \"{}\"",
                effect.name(),
                original.description(),
                action.description()
            );
            if original.is_executed() && !action.is_executed() {
                match original.add_action_and_execute(action, target) {
                    Ok(()) => attached = true,
                    Err(err) => log::warn!("Side effect \"{}\" failed: {err}", effect.name()),
                }
            } else {
                original.add_action(action);
                attached = true;
            }
        }

        original.set_side_effects_checked(true);
        attached
    }
}

impl<T: Editable> Default for SideEffectRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Editable> fmt::Debug for SideEffectRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffectRegistry")
            .field("effects", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Scope guard suspending one side effect.
///
/// Remembers the effect's previous state and restores it on drop, so
/// nested guards for the same effect unwind correctly. A guard for an
/// unknown name does nothing.
#[must_use = "the side effect resumes as soon as the guard is dropped"]
pub struct Suspender<'a, T: Editable> {
    registry: &'a SideEffectRegistry<T>,
    index: Option<usize>,
    previous: bool,
}

impl<'a, T: Editable> Suspender<'a, T> {
    pub fn new(registry: &'a SideEffectRegistry<T>, name: &str) -> Self {
        let index = registry.position(name);
        let previous = index
            .map(|i| registry.effects[i].suspended.swap(true, Ordering::Relaxed))
            .unwrap_or(false);
        Self {
            registry,
            index,
            previous,
        }
    }
}

impl<T: Editable> Drop for Suspender<'_, T> {
    fn drop(&mut self) {
        if let Some(i) = self.index {
            self.registry.effects[i]
                .suspended
                .store(self.previous, Ordering::Relaxed);
        }
    }
}
