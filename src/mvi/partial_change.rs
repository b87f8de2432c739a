//! Partial changes: self-contained state transitions.

use std::fmt::Debug;

use super::state::UiState;

/// An immutable delta produced by a change producer and folded by the
/// reducer exactly once.
///
/// Variants usually model the phases of one long-running operation
/// (`Started`, `Succeeded(payload)`, `Failed(error)`), so the reducer only
/// ever folds and never deals with asynchrony.
///
/// `reduce` must be pure: the same change applied to equal states yields
/// equal states.
pub trait PartialChange<S: UiState>: Debug + Send + 'static {
    fn reduce(self, old: S) -> S;
}
