//! Change producers: the per-screen mapping from intents to partial changes.
//!
//! The engine consumes a single function, [`ChangeProducer::produce`],
//! which turns the whole intent stream into a stream of partial changes.
//! Screens usually implement it with an [`IntentRouter`], which takes care
//! of composition strategies and failure capture.

mod router;

use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::task::JoinHandle;

use crate::context::ExecutionContext;
use crate::mvi::{Intent, PartialChange, UiState};
use crate::scope::ScopeHandle;

pub use router::{IntentRouter, SequentialPolicy, Strategy};

/// Stream of intents in submission order.
pub type IntentStream<I> = BoxStream<'static, I>;

/// Stream of partial changes handed to the reducer.
pub type ChangeStream<C> = BoxStream<'static, C>;

/// Output of one intent's work: changes, or a failure to be converted into
/// a failure change by the router.
pub type WorkStream<C> = BoxStream<'static, anyhow::Result<C>>;

/// Maps the full intent stream to a stream of partial changes.
///
/// The returned stream must never end while intents keep arriving, and
/// must not yield errors: failures are converted into failure-variant
/// changes before they reach the reducer.
pub trait ChangeProducer: Send + Sync + 'static {
    type Intent: Intent;
    type State: UiState;
    type Change: PartialChange<Self::State>;

    fn produce(
        &self,
        intents: IntentStream<Self::Intent>,
        ctx: &ProducerContext,
    ) -> ChangeStream<Self::Change>;
}

/// Where producer work runs and when it must stop.
#[derive(Clone)]
pub struct ProducerContext {
    context: ExecutionContext,
    scope: ScopeHandle,
}

impl ProducerContext {
    pub fn new(context: ExecutionContext, scope: ScopeHandle) -> Self {
        Self { context, scope }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn scope(&self) -> &ScopeHandle {
        &self.scope
    }

    /// Spawn producer work on the background domain, bound to the scope.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let scope = self.scope.clone();
        self.context
            .spawn_background(async move { scope.run(future).await })
    }
}

/// Work yielding a single change.
pub fn just<C: Send + 'static>(change: C) -> WorkStream<C> {
    stream::once(async move { Ok(change) }).boxed()
}

/// Work yielding the single change computed by `work`.
pub fn task<C, Fut>(work: Fut) -> WorkStream<C>
where
    C: Send + 'static,
    Fut: Future<Output = anyhow::Result<C>> + Send + 'static,
{
    stream::once(work).boxed()
}

/// The usual shape of a long-running operation: emit `started`, await
/// `work`, then emit `succeeded(output)` or fail with its error.
pub fn phases<C, T, Fut, F>(started: C, work: Fut, succeeded: F) -> WorkStream<C>
where
    C: Send + 'static,
    T: Send + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    F: FnOnce(T) -> C + Send + 'static,
{
    let finished = stream::once(async move { work.await.map(succeeded) });
    stream::once(async move { Ok(started) })
        .chain(finished)
        .boxed()
}
