//! Serial fold of partial changes over the current snapshot.

use super::partial_change::PartialChange;
use super::state::UiState;

/// Owns the current snapshot and folds partial changes into it.
///
/// The reducer is the only place where state transitions happen. It is
/// driven by a single task, so two reductions are never in flight at once.
#[derive(Debug)]
pub struct StateReducer<S: UiState> {
    current: S,
    revision: u64,
}

impl<S: UiState> StateReducer<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            revision: 0,
        }
    }

    /// Fold `change` into the current snapshot.
    ///
    /// Returns the new snapshot when it differs structurally from the
    /// previous one, `None` when the reduction was a no-op. Equal snapshots
    /// are the same revision and must not be republished.
    pub fn apply<C: PartialChange<S>>(&mut self, change: C) -> Option<S> {
        let next = change.reduce(self.current.clone());
        if next == self.current {
            return None;
        }
        self.current = next;
        self.revision += 1;
        Some(self.current.clone())
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    /// Number of distinct snapshots produced since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
