//! The per-screen engine: intent channel, producer, reducer and event
//! dispatcher wired into one scope-bound pipeline.
//!
//! ```text
//! submit ──→ IntentChannel ──→ ChangeProducer ──→ StateReducer ──→ StateObserver
//!                                                     │
//!                                                     └──→ EventDispatcher ──→ typed / common
//! ```

mod channel;
mod dispatcher;
mod observer;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use futures::stream::StreamExt;
use parking_lot::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::{panic_message, EngineError};
use crate::mvi::{CommonUiEvent, Intent, RoutedEvent, StateReducer, UiEvent};
use crate::producer::{ChangeProducer, ChangeStream, ProducerContext};
use crate::scope::ScopeHandle;

pub use channel::IntentChannel;
pub use dispatcher::{EventDispatcher, EventEmitter, EventReceiver};
pub use observer::{Selection, StateObserver};

use observer::StatePublisher;

type IntentOf<P> = <P as ChangeProducer>::Intent;
type StateOf<P> = <P as ChangeProducer>::State;
type ChangeOf<P> = <P as ChangeProducer>::Change;

/// Optional mapping from a partial change to at most one event.
pub type EventMapper<C, E> = Arc<dyn Fn(&C) -> Option<RoutedEvent<E>> + Send + Sync>;

/// Lifecycle of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    Uninitialized = 0,
    Running = 1,
    Terminated = 2,
}

impl Lifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Lifecycle::Uninitialized,
            1 => Lifecycle::Running,
            _ => Lifecycle::Terminated,
        }
    }
}

/// Configures and constructs an [`Engine`].
pub struct EngineBuilder<P: ChangeProducer, E> {
    producer: P,
    initial: StateOf<P>,
    mapper: Option<EventMapper<ChangeOf<P>, E>>,
    config: EngineConfig,
    context: Option<ExecutionContext>,
}

impl<P: ChangeProducer, E: UiEvent> EngineBuilder<P, E> {
    /// Map reduced changes to events (e.g. a failure to a toast).
    pub fn event_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&ChangeOf<P>) -> Option<RoutedEvent<E>> + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Execution domains to run on. Defaults to the runtime current at `start`.
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Build an engine in the `Uninitialized` state.
    ///
    /// Intents submitted before [`Engine::start`] are buffered.
    pub fn build(self) -> Engine<P, E> {
        let id = Uuid::new_v4();
        let intents = IntentChannel::new(self.config.intent_capacity, self.config.intent_overflow);
        let events = EventDispatcher::new(self.config.event_capacity, self.config.event_overflow);
        let (publisher, state) = StatePublisher::new(self.initial.clone());

        let pipeline = Pipeline {
            producer: self.producer,
            reducer: StateReducer::new(self.initial),
            publisher,
            mapper: self.mapper,
            events: events.clone(),
        };

        Engine {
            id,
            intents,
            state,
            events,
            context: self.context,
            lifecycle: Arc::new(AtomicU8::new(Lifecycle::Uninitialized as u8)),
            pipeline: Mutex::new(Some(pipeline)),
            scope: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Build and start eagerly in `scope`.
    pub fn launch(self, scope: &ScopeHandle) -> Result<Engine<P, E>, EngineError> {
        let engine = self.build();
        engine.start(scope)?;
        Ok(engine)
    }
}

/// Reactive state engine of one screen.
///
/// `E` is the screen's own event type; common events go through the
/// shared [`CommonUiEvent`] vocabulary.
pub struct Engine<P: ChangeProducer, E> {
    id: Uuid,
    intents: IntentChannel<IntentOf<P>>,
    state: StateObserver<StateOf<P>>,
    events: EventDispatcher<E>,
    context: Option<ExecutionContext>,
    lifecycle: Arc<AtomicU8>,
    pipeline: Mutex<Option<Pipeline<P, E>>>,
    scope: Mutex<Option<ScopeHandle>>,
    initialized: AtomicBool,
}

impl<P: ChangeProducer, E: UiEvent> Engine<P, E> {
    pub fn builder(producer: P, initial: StateOf<P>) -> EngineBuilder<P, E> {
        EngineBuilder {
            producer,
            initial,
            mapper: None,
            config: EngineConfig::default(),
            context: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Start the pipeline in a child of `scope`.
    ///
    /// The engine terminates when `scope` is cancelled or [`Engine::stop`]
    /// is called, whichever comes first.
    pub fn start(&self, scope: &ScopeHandle) -> Result<(), EngineError> {
        let context = match self.context.clone().or_else(ExecutionContext::try_current) {
            Some(context) => context,
            None => return Err(EngineError::NoRuntime),
        };
        let pipeline = match self.pipeline.lock().take() {
            Some(pipeline) => pipeline,
            None if self.lifecycle() == Lifecycle::Terminated => {
                return Err(EngineError::Terminated)
            }
            None => return Err(EngineError::AlreadyStarted),
        };
        if self
            .lifecycle
            .compare_exchange(
                Lifecycle::Uninitialized as u8,
                Lifecycle::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return Err(EngineError::AlreadyStarted);
        }

        let scope = scope.child();
        *self.scope.lock() = Some(scope.clone());

        let producer_ctx = ProducerContext::new(context.clone(), scope.clone());
        let changes = pipeline
            .producer
            .produce(self.intents.stream(), &producer_ctx);

        let span = tracing::info_span!("engine", id = %self.id);
        let teardown = Teardown {
            lifecycle: Arc::clone(&self.lifecycle),
            intents: self.intents.clone(),
            events: self.events.clone(),
            scope: scope.clone(),
        };
        context.spawn_background(
            async move {
                let _teardown = teardown;
                tracing::debug!("Engine running");
                pipeline.run(changes, &scope).await;
            }
            .instrument(span),
        );
        Ok(())
    }

    /// Terminate: cancel in-flight producer work and stop reduction. The
    /// last snapshot stays readable.
    pub fn stop(&self) {
        self.lifecycle
            .store(Lifecycle::Terminated as u8, Ordering::SeqCst);
        self.intents.close();
        if let Some(scope) = self.scope.lock().as_ref() {
            scope.cancel();
        }
        if self.pipeline.lock().take().is_some() {
            // Never started: nothing will drain the event buffers.
            self.events.close();
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        let lifecycle = Lifecycle::from_u8(self.lifecycle.load(Ordering::SeqCst));
        let scope_ended = self
            .scope
            .lock()
            .as_ref()
            .is_some_and(ScopeHandle::is_cancelled);
        if lifecycle == Lifecycle::Running && scope_ended {
            return Lifecycle::Terminated;
        }
        lifecycle
    }

    /// Enqueue an intent without waiting.
    pub fn submit(&self, intent: IntentOf<P>) -> Result<(), EngineError> {
        if self.lifecycle() == Lifecycle::Terminated {
            return Err(EngineError::Terminated);
        }
        self.intents.submit(intent)
    }

    /// Submit `intents` the first time this is called; later calls do
    /// nothing and return `Ok(false)`.
    pub fn submit_initial<I>(&self, intents: I) -> Result<bool, EngineError>
    where
        I: IntoIterator<Item = IntentOf<P>>,
    {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        for intent in intents {
            self.submit(intent)?;
        }
        Ok(true)
    }

    /// Current snapshot.
    pub fn state(&self) -> StateOf<P> {
        self.state.current()
    }

    pub fn observe_state(&self) -> StateObserver<StateOf<P>> {
        self.state.clone()
    }

    pub fn observe_typed_events(&self) -> EventReceiver<E> {
        self.events.typed_receiver()
    }

    pub fn observe_common_events(&self) -> EventReceiver<CommonUiEvent> {
        self.events.common_receiver()
    }

    pub fn emitter(&self) -> EventEmitter<E> {
        self.events.emitter()
    }

    /// Intents waiting to be picked up by the producer.
    pub fn pending_intents(&self) -> usize {
        self.intents.pending()
    }
}

impl<P: ChangeProducer, E> Drop for Engine<P, E> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.get_mut().as_ref() {
            scope.cancel();
        }
    }
}

/// Everything the reducer task owns.
struct Pipeline<P: ChangeProducer, E> {
    producer: P,
    reducer: StateReducer<StateOf<P>>,
    publisher: StatePublisher<StateOf<P>>,
    mapper: Option<EventMapper<ChangeOf<P>, E>>,
    events: EventDispatcher<E>,
}

impl<P: ChangeProducer, E: UiEvent> Pipeline<P, E> {
    async fn run(mut self, mut changes: ChangeStream<ChangeOf<P>>, scope: &ScopeHandle) {
        loop {
            let change = tokio::select! {
                biased;
                _ = scope.cancelled() => break,
                next = changes.next() => match next {
                    Some(change) => change,
                    None => break,
                },
            };

            tracing::trace!(change = ?change, "partialChange");
            let mapper = self.mapper.as_ref();
            let reducer = &mut self.reducer;
            let step = panic::catch_unwind(AssertUnwindSafe(|| {
                let event = mapper.and_then(|mapper| mapper(&change));
                (reducer.apply(change), event)
            }));

            let (state, event) = match step {
                Ok(step) => step,
                Err(payload) => {
                    // The snapshot is left as it was before this change.
                    tracing::error!("Reducer panicked: {}", panic_message(payload.as_ref()));
                    continue;
                }
            };
            if let Some(state) = state {
                self.publisher.publish(state, self.reducer.revision());
            }
            if let Some(event) = event {
                self.events.dispatch(event);
            }
        }
    }
}

/// Moves the engine to `Terminated` however the pipeline task ends,
/// including by unwinding.
struct Teardown<I: Intent, E: UiEvent> {
    lifecycle: Arc<AtomicU8>,
    intents: IntentChannel<I>,
    events: EventDispatcher<E>,
    scope: ScopeHandle,
}

impl<I: Intent, E: UiEvent> Drop for Teardown<I, E> {
    fn drop(&mut self) {
        self.lifecycle
            .store(Lifecycle::Terminated as u8, Ordering::SeqCst);
        self.intents.close();
        self.events.close();
        self.scope.cancel();
        tracing::debug!("Engine terminated");
    }
}
