//! Collaborators the store calls out to, and the redraw debouncer.

use std::time::{Duration, Instant};

use crate::error::LabelError;
use crate::model::{AnnotationId, WireRecord};
use crate::validation::ValidationReport;

/// Default debounce window for redraw requests.
pub const DEFAULT_REDRAW_WINDOW: Duration = Duration::from_millis(30);

/// Callbacks into the surrounding application.
///
/// Every method has a no-op default. Hooks receive plain data, never the
/// store, so a callback cannot re-enter the mutation that triggered it.
pub trait StoreHooks {
    /// Keyboard shortcuts must be rebound to the newly selected entity.
    fn rebind_hotkeys(&mut self, _selected: &AnnotationId) {}

    /// Persists a draft. A failure leaves the in-memory state untouched.
    fn save_draft(
        &mut self,
        _annotation: &AnnotationId,
        _records: &[WireRecord],
    ) -> Result<(), LabelError> {
        Ok(())
    }

    /// Receives validation errors, one tick after they were found.
    fn on_validation_errors(&mut self, _report: &ValidationReport) {}

    fn on_delete_annotation(&mut self, _annotation: &AnnotationId) {}

    fn redraw(&mut self) {}
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl StoreHooks for NoopHooks {}

/// Collapses bursts of redraw requests into one.
///
/// Each request pushes the deadline to `now + window`; [`poll`] fires once
/// the deadline has passed.
///
/// [`poll`]: RedrawDebouncer::poll
#[derive(Clone, Debug)]
pub struct RedrawDebouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Default for RedrawDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_REDRAW_WINDOW)
    }
}

impl RedrawDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn request(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once per burst, when the window has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
