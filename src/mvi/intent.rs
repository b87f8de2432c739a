//! Base trait for intents (user/system commands) in MVI architecture.

use std::fmt::Debug;

/// Marker trait for intent objects.
///
/// Intents represent:
/// - User actions (refresh, like, load more)
/// - System commands (initial load, account change reactions)
///
/// Each screen defines its intents as a closed enum. The variant decides
/// which producer logic handles it and under which composition strategy.
pub trait Intent: Debug + Send + 'static {}
