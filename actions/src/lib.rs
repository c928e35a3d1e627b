//! # RedLilium Actions
//!
//! Undoable action trees for interactive editors.
//!
//! - [`Action`] — a tree node that executes, undoes and redoes itself
//!   together with its ordered sub-actions
//! - [`ActionBehavior`] — per-kind hooks (execute/undo/redo/merge/describe)
//! - [`RestorePointAction`] — a history checkpoint holding borrowed redo entries
//! - [`SideEffectRegistry`] — ordered plugins that extend a performed action
//!   with consequential sub-actions
//! - [`ActionsConfig`] — TOML configuration for detail formatting and
//!   suspended side effects
//!
//! The undo stack that owns top-level actions lives outside this crate; it
//! drives [`Action::execute_all`], [`Action::undo_all`], [`Action::redo_all`]
//! and [`Action::merge`].

pub mod action;
pub mod config;
pub mod side_effect;

pub use action::{
    Action, ActionBehavior, ActionError, ActionResult, AsAny, EditTime, Editable, Group,
    LogProgress, MultiAction, Progress, RestorePointAction, SharedAction,
};
pub use config::{
    ActionsConfig, ConfigError, DetailFormat, SideEffectsConfig, load_config, load_or_default,
};
pub use side_effect::{SideEffect, SideEffectRegistry, Suspender};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
