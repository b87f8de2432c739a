//! Base trait for UI state in MVI architecture.

use std::fmt::Debug;

/// Marker trait for UI state objects.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Self-contained (all data needed to render the view)
/// - Comparable (PartialEq decides whether a reduction produced a new revision)
///
/// Snapshots are shared with any number of observers, hence `Sync`.
pub trait UiState: Clone + PartialEq + Debug + Send + Sync + 'static {}
