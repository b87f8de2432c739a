//! Engine error types.

use thiserror::Error;

/// Errors returned by engine lifecycle operations.
///
/// Producer failures never show up here: they are converted into partial
/// changes and surface as ordinary state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `start` was called on an engine that is already running or stopped.
    #[error("engine already started")]
    AlreadyStarted,

    /// No execution context was supplied and no tokio runtime is current.
    #[error("no tokio runtime available to run the engine")]
    NoRuntime,

    /// The owning scope ended; the engine no longer accepts intents.
    #[error("engine terminated")]
    Terminated,
}

/// Readable text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
