//! Execution domains injected into engines and subscriptions.
//!
//! The reducer pipeline and producer work run on the background domain;
//! UI-facing listeners run on the foreground domain. Both are plain tokio
//! runtime handles passed in by the embedder, never a global default, so
//! tests can run everything on one deterministic current-thread runtime.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Foreground/background pair of runtime handles.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    foreground: Handle,
    background: Handle,
}

impl ExecutionContext {
    pub fn new(foreground: Handle, background: Handle) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// Both domains on the runtime the caller is running in.
    ///
    /// Under `#[tokio::test]` this is a single current-thread runtime, which
    /// makes the whole pipeline deterministic.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        let handle = Handle::current();
        Self::new(handle.clone(), handle)
    }

    /// Both domains on the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|handle| Self::new(handle.clone(), handle))
    }

    pub fn foreground(&self) -> &Handle {
        &self.foreground
    }

    pub fn background(&self) -> &Handle {
        &self.background
    }

    pub fn spawn_foreground<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.foreground.spawn(future)
    }

    pub fn spawn_background<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.background.spawn(future)
    }
}
