//! Intent routing with per-variant composition strategies.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::mem::Discriminant;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::stream::StreamExt;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use super::{ChangeProducer, ChangeStream, IntentStream, ProducerContext, WorkStream};
use crate::error::panic_message;
use crate::mvi::{Intent, PartialChange, UiState};

/// What happens when an intent arrives while work of the same variant is
/// still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialPolicy {
    /// Wait for the in-flight work to finish, then start the new one.
    Queue,
    /// Abort the in-flight work and start the new one immediately.
    CancelPrevious,
}

/// Composition strategy of one intent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serialized with other intents of the same variant.
    Sequential(SequentialPolicy),
    /// Runs in parallel with everything else.
    Concurrent,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Sequential(SequentialPolicy::Queue)
    }
}

type Handler<I, C> = Arc<dyn Fn(I) -> WorkStream<C> + Send + Sync>;
type StrategyFn<I> = Arc<dyn Fn(&I) -> Strategy + Send + Sync>;
type FailureFn<C> = Arc<dyn Fn(anyhow::Error) -> C + Send + Sync>;

/// [`ChangeProducer`] built from a total `match` over intent variants.
///
/// ```ignore
/// let router = IntentRouter::new(
///     move |intent| match intent {
///         FeedIntent::Refresh => phases(FeedChange::Started, repo.load(), FeedChange::Loaded),
///         FeedIntent::Like(id) => phases(FeedChange::Liking(id), repo.like(id), FeedChange::Liked),
///     },
///     |error| FeedChange::Failed(error.to_string()),
/// )
/// .with_strategy(|intent| match intent {
///     FeedIntent::Refresh => Strategy::Sequential(SequentialPolicy::CancelPrevious),
///     FeedIntent::Like(_) => Strategy::Concurrent,
/// });
/// ```
///
/// Sequential lanes are keyed by the intent's enum variant. A failing or
/// panicking handler yields one `on_failure` change and ends only that
/// intent's work; the output stream keeps running.
pub struct IntentRouter<I, S, C> {
    handler: Handler<I, C>,
    strategy: StrategyFn<I>,
    on_failure: FailureFn<C>,
    _state: PhantomData<fn() -> S>,
}

impl<I, S, C> IntentRouter<I, S, C>
where
    I: Intent,
    S: UiState,
    C: PartialChange<S>,
{
    pub fn new<H, F>(handler: H, on_failure: F) -> Self
    where
        H: Fn(I) -> WorkStream<C> + Send + Sync + 'static,
        F: Fn(anyhow::Error) -> C + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            strategy: Arc::new(|_| Strategy::default()),
            on_failure: Arc::new(on_failure),
            _state: PhantomData,
        }
    }

    pub fn with_strategy<F>(mut self, strategy: F) -> Self
    where
        F: Fn(&I) -> Strategy + Send + Sync + 'static,
    {
        self.strategy = Arc::new(strategy);
        self
    }
}

impl<I, S, C> ChangeProducer for IntentRouter<I, S, C>
where
    I: Intent,
    S: UiState,
    C: PartialChange<S>,
{
    type Intent = I;
    type State = S;
    type Change = C;

    fn produce(&self, intents: IntentStream<I>, ctx: &ProducerContext) -> ChangeStream<C> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch {
            worker: Worker {
                handler: Arc::clone(&self.handler),
                on_failure: Arc::clone(&self.on_failure),
                output: tx,
            },
            strategy: Arc::clone(&self.strategy),
            ctx: ctx.clone(),
            queues: HashMap::new(),
            latest: HashMap::new(),
        };
        ctx.spawn(dispatch.run(intents));

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|change| (change, rx))
        })
        .boxed()
    }
}

/// Runs one intent's work and forwards its changes.
struct Worker<I, C> {
    handler: Handler<I, C>,
    on_failure: FailureFn<C>,
    output: mpsc::UnboundedSender<C>,
}

impl<I, C> Clone for Worker<I, C> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            on_failure: Arc::clone(&self.on_failure),
            output: self.output.clone(),
        }
    }
}

impl<I: Intent, C: Send + 'static> Worker<I, C> {
    /// Run `intent`'s work. With a `lease`, output stops as soon as the
    /// lease is superseded.
    async fn execute(&self, intent: I, lease: Option<Lease>) {
        let description = format!("{:?}", intent);
        let lease = lease.as_ref();
        let work = AssertUnwindSafe(async {
            let mut changes = (self.handler)(intent);
            while let Some(item) = changes.next().await {
                match item {
                    Ok(change) => {
                        if !self.forward(lease, change) {
                            return;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(intent = %description, "Producer failed: {:#}", error);
                        self.forward(lease, (self.on_failure)(error));
                        return;
                    }
                }
            }
        });

        if let Err(panic) = work.catch_unwind().await {
            let message = panic_message(panic.as_ref());
            tracing::error!(intent = %description, "Producer panicked: {}", message);
            let error = anyhow::anyhow!("producer panicked: {}", message);
            self.forward(lease, (self.on_failure)(error));
        }
    }

    /// Send `change` downstream; `false` when the work should stop.
    fn forward(&self, lease: Option<&Lease>, change: C) -> bool {
        match lease {
            Some(lease) => {
                let current = lease.lane.lock();
                if *current != lease.generation {
                    tracing::trace!("Dropping output of superseded work");
                    return false;
                }
                self.output.send(change).is_ok()
            }
            None => self.output.send(change).is_ok(),
        }
    }
}

/// Claim on a `CancelPrevious` lane, valid until a newer intent of the
/// same variant arrives.
///
/// Aborting the superseded task does not stop a poll already running on
/// another worker thread, so every send is checked against the lane's
/// generation under its lock.
struct Lease {
    lane: Arc<Mutex<u64>>,
    generation: u64,
}

/// State of one `CancelPrevious` lane.
#[derive(Default)]
struct Lane {
    generation: Arc<Mutex<u64>>,
    in_flight: Option<AbortHandle>,
}

impl Lane {
    /// Invalidate every earlier lease and hand out a new one.
    fn supersede(&mut self) -> Lease {
        let mut current = self.generation.lock();
        *current += 1;
        Lease {
            lane: Arc::clone(&self.generation),
            generation: *current,
        }
    }
}

/// Reads the intent stream and hands each intent to a lane or task.
struct Dispatch<I, C> {
    worker: Worker<I, C>,
    strategy: StrategyFn<I>,
    ctx: ProducerContext,
    /// Per-variant queues for `SequentialPolicy::Queue`.
    queues: HashMap<Discriminant<I>, mpsc::UnboundedSender<I>>,
    /// Lanes per variant for `SequentialPolicy::CancelPrevious`.
    latest: HashMap<Discriminant<I>, Lane>,
}

impl<I: Intent, C: Send + 'static> Dispatch<I, C> {
    async fn run(mut self, mut intents: IntentStream<I>) {
        while let Some(intent) = intents.next().await {
            match (self.strategy)(&intent) {
                Strategy::Concurrent => {
                    let worker = self.worker.clone();
                    self.ctx.spawn(async move { worker.execute(intent, None).await });
                }
                Strategy::Sequential(SequentialPolicy::Queue) => self.enqueue(intent),
                Strategy::Sequential(SequentialPolicy::CancelPrevious) => self.replace(intent),
            }
        }
        tracing::debug!("Intent stream closed");
    }

    fn enqueue(&mut self, intent: I) {
        let lane = std::mem::discriminant(&intent);
        let intent = match self.queues.get(&lane) {
            Some(queue) => match queue.send(intent) {
                Ok(()) => return,
                Err(mpsc::error::SendError(intent)) => intent,
            },
            None => intent,
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<I>();
        let worker = self.worker.clone();
        self.ctx.spawn(async move {
            while let Some(intent) = rx.recv().await {
                worker.execute(intent, None).await;
            }
        });
        // The lane was just created, so its receiver is alive.
        let _ = tx.send(intent);
        self.queues.insert(lane, tx);
    }

    fn replace(&mut self, intent: I) {
        let lane = self
            .latest
            .entry(std::mem::discriminant(&intent))
            .or_default();
        let lease = lane.supersede();
        if let Some(previous) = lane.in_flight.take() {
            if !previous.is_finished() {
                tracing::debug!(intent = ?intent, "Cancelling in-flight work of the same kind");
            }
            previous.abort();
        }
        let worker = self.worker.clone();
        let handle = self
            .ctx
            .spawn(async move { worker.execute(intent, Some(lease)).await });
        lane.in_flight = Some(handle.abort_handle());
    }
}
