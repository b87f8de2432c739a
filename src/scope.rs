//! Cancellation scopes owning engine pipelines and subscriptions.
//!
//! A [`Scope`] is held by whatever owns the work (a screen host, a test).
//! Tasks receive a [`ScopeHandle`] and stop when the scope is cancelled,
//! either explicitly or because the `Scope` was dropped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;

struct ScopeInner {
    cancelled: AtomicBool,
    notify: Notify,
    children: Mutex<Vec<Weak<ScopeInner>>>,
}

impl ScopeInner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
            children: Mutex::new(Vec::new()),
        })
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        self.notify.notify_waiters();
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// Owner of a cancellation domain. Cancels on drop.
pub struct Scope {
    handle: ScopeHandle,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            handle: ScopeHandle {
                inner: ScopeInner::new(),
            },
        }
    }

    /// Create a handle for sharing with tasks.
    pub fn handle(&self) -> ScopeHandle {
        self.handle.clone()
    }

    /// Create a scope that is cancelled together with this one.
    pub fn child(&self) -> Scope {
        Scope {
            handle: self.handle.child(),
        }
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

/// Lightweight handle for observing and triggering cancellation.
#[derive(Clone)]
pub struct ScopeHandle {
    inner: Arc<ScopeInner>,
}

impl ScopeHandle {
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Create a handle cancelled together with this one, or by itself.
    pub fn child(&self) -> ScopeHandle {
        let child = ScopeInner::new();
        {
            let mut children = self.inner.children.lock();
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        // Cancellation may have happened before registration was visible.
        if self.is_cancelled() {
            child.cancel();
        }
        ScopeHandle { inner: child }
    }

    /// Resolve once the scope is cancelled.
    pub async fn cancelled(&self) {
        // Subscribe to Notify BEFORE checking the flag: cancel() could fire
        // between the check and the await, and notify_waiters() would have
        // no subscribers.
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Drive `future` until it completes or the scope is cancelled.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}
