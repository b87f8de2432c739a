//! Shared test fixtures: a small feed screen built on the engine.

#![allow(dead_code, unused_imports)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mvi_engine::mvi::{CommonUiEvent, Intent, PartialChange, RoutedEvent, UiEvent, UiState};
use mvi_engine::producer::{just, phases, task};
use mvi_engine::{Engine, IntentRouter, ScopeHandle, SequentialPolicy, Strategy};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedState {
    pub loading: bool,
    pub items: Vec<u32>,
    pub liked: Vec<u32>,
}

impl UiState for FeedState {}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedIntent {
    Refresh,
    /// Likes post `id` after `id` milliseconds.
    Like(u32),
    /// Produces a change that leaves the state untouched.
    Touch,
    /// Handler panics.
    Crash,
    /// Produces a change whose reduction panics.
    Corrupt,
}

impl Intent for FeedIntent {}

#[derive(Debug)]
pub enum FeedChange {
    RefreshStarted,
    RefreshSucceeded(Vec<u32>),
    Failed(String),
    Liked(u32),
    Touched,
    Corrupted,
}

impl PartialChange<FeedState> for FeedChange {
    fn reduce(self, old: FeedState) -> FeedState {
        match self {
            FeedChange::RefreshStarted => FeedState {
                loading: true,
                ..old
            },
            FeedChange::RefreshSucceeded(items) => FeedState {
                loading: false,
                items,
                ..old
            },
            FeedChange::Failed(_) => FeedState {
                loading: false,
                ..old
            },
            FeedChange::Liked(id) => {
                let mut liked = old.liked;
                liked.push(id);
                FeedState { liked, ..old }
            }
            FeedChange::Touched => old,
            FeedChange::Corrupted => panic!("corrupted feed state"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Loaded(Vec<u32>),
    Liked(u32),
}

impl UiEvent for FeedEvent {}

/// One scripted answer of [`FakeFeedRepository::load`].
pub struct Scripted {
    pub delay: Duration,
    pub result: Result<Vec<u32>, String>,
}

impl Scripted {
    pub fn items(items: &[u32]) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(items.to_vec()),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Repository double answering loads from a script.
///
/// A gated repository holds every load until [`release`] is called.
///
/// [`release`]: FakeFeedRepository::release
pub struct FakeFeedRepository {
    script: Mutex<VecDeque<Scripted>>,
    gate: Option<Semaphore>,
    loads: AtomicUsize,
}

impl FakeFeedRepository {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            gate: None,
            loads: AtomicUsize::new(0),
        })
    }

    pub fn gated(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            gate: Some(Semaphore::new(0)),
            loads: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub async fn load(&self) -> anyhow::Result<Vec<u32>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Scripted::items(&[]));
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        if !next.delay.is_zero() {
            tokio::time::sleep(next.delay).await;
        }
        next.result.map_err(anyhow::Error::msg)
    }
}

pub type FeedRouter = IntentRouter<FeedIntent, FeedState, FeedChange>;
pub type FeedEngine = Engine<FeedRouter, FeedEvent>;

pub fn feed_router(repo: Arc<FakeFeedRepository>, refresh: SequentialPolicy) -> FeedRouter {
    IntentRouter::new(
        move |intent: FeedIntent| match intent {
            FeedIntent::Refresh => {
                let repo = Arc::clone(&repo);
                phases(
                    FeedChange::RefreshStarted,
                    async move { repo.load().await },
                    FeedChange::RefreshSucceeded,
                )
            }
            FeedIntent::Like(id) => task(async move {
                tokio::time::sleep(Duration::from_millis(u64::from(id))).await;
                Ok(FeedChange::Liked(id))
            }),
            FeedIntent::Touch => just(FeedChange::Touched),
            FeedIntent::Crash => panic!("boom"),
            FeedIntent::Corrupt => just(FeedChange::Corrupted),
        },
        |error: anyhow::Error| FeedChange::Failed(error.to_string()),
    )
    .with_strategy(move |intent| match intent {
        FeedIntent::Refresh => Strategy::Sequential(refresh),
        FeedIntent::Like(_) => Strategy::Concurrent,
        FeedIntent::Touch | FeedIntent::Crash | FeedIntent::Corrupt => {
            Strategy::Sequential(SequentialPolicy::Queue)
        }
    })
}

pub fn feed_events(change: &FeedChange) -> Option<RoutedEvent<FeedEvent>> {
    match change {
        FeedChange::Failed(message) => Some(CommonUiEvent::toast(message.clone()).into()),
        FeedChange::RefreshSucceeded(items) => Some(RoutedEvent::Typed(FeedEvent::Loaded(items.clone()))),
        FeedChange::Liked(id) => Some(RoutedEvent::Typed(FeedEvent::Liked(*id))),
        FeedChange::RefreshStarted | FeedChange::Touched | FeedChange::Corrupted => None,
    }
}

/// A started feed engine using `refresh` for overlapping refreshes.
pub fn feed_engine(
    repo: Arc<FakeFeedRepository>,
    refresh: SequentialPolicy,
    scope: &ScopeHandle,
) -> FeedEngine {
    Engine::builder(feed_router(repo, refresh), FeedState::default())
        .event_mapper(feed_events)
        .launch(scope)
        .expect("engine starts inside a tokio runtime")
}

/// Let every spawned task run until nothing is ready.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
