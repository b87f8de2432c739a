//! Process-wide hot pub/sub channel for cross-engine choreography.
//!
//! The bus is an explicitly constructed value handed to whoever needs it,
//! never an ambient global. Delivery is at-most-once per subscriber that is
//! attached at publication time: there is no replay and no persistence.

mod event;

use std::future::Future;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::config::BusConfig;
use crate::context::ExecutionContext;
use crate::scope::Scope;
use crate::subscription::Subscription;

pub use event::{EventFilter, GlobalEvent, GlobalEventKind, ReplySuccess};

/// Cloneable handle to one shared broadcast channel.
#[derive(Clone)]
pub struct GlobalEventBus {
    sender: broadcast::Sender<GlobalEvent>,
}

impl GlobalEventBus {
    pub fn new(config: &BusConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    /// `capacity` publications are retained for a lagging subscriber;
    /// older ones are skipped.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcast `event` to current subscribers without waiting.
    pub fn publish(&self, event: GlobalEvent) {
        let _ = self.try_publish(event);
    }

    /// Broadcast `event`, returning how many subscribers it reached.
    pub fn try_publish(&self, event: GlobalEvent) -> usize {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::trace!(?kind, receivers, "Global event published");
                receivers
            }
            Err(_) => {
                tracing::trace!(?kind, "Global event published with no subscribers");
                0
            }
        }
    }

    /// Receive publications made from now on that pass `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> GlobalEventReceiver {
        GlobalEventReceiver {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    /// Run `listener` on the foreground domain for every matching
    /// publication until the returned [`Subscription`] is cancelled or dropped.
    pub fn on_event<F, Fut>(
        &self,
        context: &ExecutionContext,
        filter: EventFilter,
        mut listener: F,
    ) -> Subscription
    where
        F: FnMut(GlobalEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scope = Scope::new();
        let handle = scope.handle();
        let mut receiver = self.subscribe(filter);
        context.spawn_foreground(async move {
            handle
                .run(async move {
                    while let Some(event) = receiver.recv().await {
                        listener(event).await;
                    }
                })
                .await
        });
        Subscription::new(scope)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for GlobalEventBus {
    fn default() -> Self {
        Self::new(&BusConfig::default())
    }
}

/// One subscriber's view of the bus.
pub struct GlobalEventReceiver {
    receiver: broadcast::Receiver<GlobalEvent>,
    filter: EventFilter,
}

impl GlobalEventReceiver {
    /// Wait for the next matching publication. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<GlobalEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Global event subscriber lagging, oldest events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching publication if one is already waiting.
    pub fn try_recv(&mut self) -> Option<GlobalEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Global event subscriber lagging, oldest events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
