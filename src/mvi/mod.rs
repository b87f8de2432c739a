//! Model-View-Intent (MVI) message vocabulary.
//!
//! This module provides the base traits every screen implements for
//! unidirectional data flow.
//!
//! # Architecture
//!
//! ```text
//! Intent ──→ Producer ──→ PartialChange ──→ Reducer ──→ State ──→ View
//!    ↑                                         │                    │
//!    │                                         └──→ Event ──────────┤
//!    └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Intent**: user actions or system commands
//! - **PartialChange**: pure transition `old state -> new state`
//! - **State**: immutable representation of UI state
//! - **Event**: one-shot side effect (typed per screen, or common)

mod event;
mod intent;
mod partial_change;
mod reducer;
mod state;

pub use event::{CommonUiEvent, MediaKind, RoutedEvent, ToastDuration, UiEvent};
pub use intent::Intent;
pub use partial_change::PartialChange;
pub use reducer::StateReducer;
pub use state::UiState;
