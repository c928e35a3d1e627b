//! Linear progress reporting for action trees.
//!
//! [`Progress`] is implemented by the host application (a status bar, a
//! modal dialog). [`ProgressReporter`] flattens a tree walk into
//! monotonically increasing fractions in `[0, 1]`.

/// Receiver of progress updates, owned by the host application.
pub trait Progress {
    /// Sets the text describing the step currently being processed.
    fn set_text(&mut self, text: &str);

    /// Reports the completed fraction in `[0, 1]`.
    fn update(&mut self, fraction: f32);

    /// Opens a nested progress scope covering `units` steps.
    fn begin_scope(&mut self, _units: usize) {}

    /// Closes the scope opened by [`begin_scope`](Self::begin_scope).
    fn end_scope(&mut self) {}

    /// Whether the user asked to cancel. Action trees never poll this;
    /// individual hooks may.
    fn is_canceled(&self) -> bool {
        false
    }
}

/// A [`Progress`] sink that writes updates to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    label: String,
    last_fraction: f32,
}

impl LogProgress {
    /// Creates a sink prefixing every message with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_fraction: 0.0,
        }
    }

    /// The most recently reported fraction.
    pub fn last_fraction(&self) -> f32 {
        self.last_fraction
    }
}

impl Progress for LogProgress {
    fn set_text(&mut self, text: &str) {
        log::debug!("{}: {text}", self.label);
    }

    fn update(&mut self, fraction: f32) {
        self.last_fraction = fraction;
        log::debug!("{}: {:.0}%", self.label, fraction * 100.0);
    }
}

/// Translates a tree walk into linear progress updates.
///
/// Created once per top-level `execute_all` / `undo_all` / `redo_all`
/// call with the number of sub-actions in the whole tree. Every visited
/// sub-action advances the fraction by `1 / units`.
pub(crate) struct ProgressReporter<'a> {
    progress: Option<&'a mut dyn Progress>,
    units: usize,
    done: usize,
    last_fraction: f32,
}

impl<'a> ProgressReporter<'a> {
    /// A childless tree still counts as one unit.
    pub(crate) fn new(mut progress: Option<&'a mut dyn Progress>, units: usize) -> Self {
        let units = units.max(1);
        if let Some(p) = progress.as_deref_mut() {
            p.begin_scope(units);
        }
        Self {
            progress,
            units,
            done: 0,
            last_fraction: 0.0,
        }
    }

    /// Marks the start of one sub-action.
    pub(crate) fn advance(&mut self, description: &str) {
        self.done += 1;
        let fraction = (self.done as f32 / self.units as f32).min(1.0);
        if let Some(p) = self.progress.as_deref_mut() {
            if !description.is_empty() {
                p.set_text(description);
            }
            if fraction > self.last_fraction {
                p.update(fraction);
            }
        }
        self.last_fraction = self.last_fraction.max(fraction);
    }

    /// Reports completion if the walk visited fewer units than counted.
    pub(crate) fn finish(&mut self) {
        if self.last_fraction < 1.0 {
            if let Some(p) = self.progress.as_deref_mut() {
                p.update(1.0);
            }
            self.last_fraction = 1.0;
        }
    }
}

impl Drop for ProgressReporter<'_> {
    fn drop(&mut self) {
        if let Some(p) = self.progress.as_deref_mut() {
            p.end_scope();
        }
    }
}
