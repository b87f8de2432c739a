//! Read side of the current state snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use crate::mvi::UiState;

/// Writer half, owned by the reducer pipeline.
pub(crate) struct StatePublisher<S> {
    sender: watch::Sender<S>,
    revision: Arc<AtomicU64>,
}

impl<S: UiState> StatePublisher<S> {
    pub(crate) fn new(initial: S) -> (Self, StateObserver<S>) {
        let (sender, receiver) = watch::channel(initial);
        let revision = Arc::new(AtomicU64::new(0));
        let observer = StateObserver {
            receiver,
            revision: Arc::clone(&revision),
        };
        (Self { sender, revision }, observer)
    }

    pub(crate) fn publish(&self, state: S, revision: u64) {
        self.revision.store(revision, Ordering::SeqCst);
        self.sender.send_replace(state);
    }
}

/// Broadcast cell holding the latest snapshot.
///
/// Attaching late yields the latest snapshot, never a replay. Observers
/// that fall behind skip intermediate snapshots. After the engine
/// terminated the final snapshot stays readable.
pub struct StateObserver<S> {
    receiver: watch::Receiver<S>,
    revision: Arc<AtomicU64>,
}

impl<S> Clone for StateObserver<S> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<S: UiState> StateObserver<S> {
    pub fn current(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Number of distinct snapshots published after the initial one.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Wait for a snapshot this observer has not seen yet.
    ///
    /// Returns `None` once the engine terminated and nothing new is left.
    pub async fn changed(&mut self) -> Option<S> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the snapshot satisfies `predicate`, checking the current
    /// one first.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<S>
    where
        F: FnMut(&S) -> bool,
    {
        self.receiver
            .wait_for(|state| predicate(state))
            .await
            .ok()
            .map(|state| state.clone())
    }

    /// The latest snapshot followed by every future one.
    pub fn into_stream(mut self) -> BoxStream<'static, S> {
        let first = self.receiver.borrow_and_update().clone();
        stream::once(async move { first })
            .chain(stream::unfold(self, |mut observer| async move {
                observer.changed().await.map(|state| (state, observer))
            }))
            .boxed()
    }

    /// Observe one projection of the state, emitted only when it changes.
    pub fn select<T, F>(self, project: F) -> Selection<S, T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        Selection {
            observer: self,
            project: Box::new(project),
            last: None,
        }
    }
}

/// Distinct-until-changed view of one part of the state.
pub struct Selection<S, T> {
    observer: StateObserver<S>,
    project: Box<dyn Fn(&S) -> T + Send + Sync>,
    last: Option<T>,
}

impl<S: UiState, T: Clone + PartialEq + Send + Sync + 'static> Selection<S, T> {
    pub fn current(&self) -> T {
        (self.project)(&self.observer.receiver.borrow())
    }

    /// The current projection on first call, then each distinct new value.
    pub async fn next(&mut self) -> Option<T> {
        if self.last.is_none() {
            let value = (self.project)(&self.observer.receiver.borrow_and_update());
            self.last = Some(value.clone());
            return Some(value);
        }
        loop {
            let state = self.observer.changed().await?;
            let value = (self.project)(&state);
            if self.last.as_ref() != Some(&value) {
                self.last = Some(value.clone());
                return Some(value);
            }
        }
    }
}
