//! Per-annotation undo/redo.
//!
//! Each recorded step is a full copy of the annotation's regions and
//! relations taken *before* a mutation. Undo swaps the current state with the
//! latest snapshot; redo swaps it back.

use tracing::debug;

use super::region::Region;
use super::relation::Relation;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub regions: Vec<Region>,
    pub relations: Vec<Relation>,
}

#[derive(Clone, Debug)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: vec![],
            redo: vec![],
            limit: limit.max(1),
        }
    }

    /// Records the state before a mutation. Clears the redo stack.
    pub fn record(&mut self, before: Snapshot) {
        self.undo.push(before);
        if self.undo.len() > self.limit {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Returns the state to restore, stashing `current` for redo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        debug!(remaining = self.undo.len(), "undo");
        Some(previous)
    }

    /// Returns the state to restore, stashing `current` for undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        debug!(remaining = self.redo.len(), "redo");
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Forgets every recorded step.
    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
