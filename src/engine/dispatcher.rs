//! Routing of reducer side-outputs into typed and common event buffers.

use futures::stream::{self, BoxStream, StreamExt};

use crate::buffer::{BoundedBuffer, OverflowPolicy, PushOutcome};
use crate::mvi::{CommonUiEvent, RoutedEvent, UiEvent};

/// Typed and common event buffers of one engine.
///
/// Both buffers keep events while nobody is listening, up to capacity. An
/// event is delivered to exactly one receiver.
pub struct EventDispatcher<E> {
    typed: BoundedBuffer<E>,
    common: BoundedBuffer<CommonUiEvent>,
}

impl<E> Clone for EventDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            typed: self.typed.clone(),
            common: self.common.clone(),
        }
    }
}

impl<E: UiEvent> EventDispatcher<E> {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            typed: BoundedBuffer::new(capacity, policy),
            common: BoundedBuffer::new(capacity, policy),
        }
    }

    pub fn dispatch(&self, event: RoutedEvent<E>) {
        match event {
            RoutedEvent::Common(event) => self.emit_common(event),
            RoutedEvent::Typed(event) => self.emit(event),
            RoutedEvent::Other(event) => {
                tracing::warn!(event = ?event, "Unhandled UiEvent type");
            }
        }
    }

    pub fn emit(&self, event: E) {
        tracing::trace!(event = ?event, "event");
        log_push("typed", self.typed.push(event));
    }

    pub fn emit_common(&self, event: CommonUiEvent) {
        tracing::trace!(event = ?event, "common event");
        log_push("common", self.common.push(event));
    }

    pub fn typed_receiver(&self) -> EventReceiver<E> {
        EventReceiver {
            buffer: self.typed.clone(),
        }
    }

    pub fn common_receiver(&self) -> EventReceiver<CommonUiEvent> {
        EventReceiver {
            buffer: self.common.clone(),
        }
    }

    pub fn emitter(&self) -> EventEmitter<E> {
        EventEmitter {
            dispatcher: self.clone(),
        }
    }

    /// Stop accepting events; receivers drain what is left, then end.
    pub fn close(&self) {
        self.typed.close();
        self.common.close();
    }
}

fn log_push<T: std::fmt::Debug>(buffer: &'static str, outcome: PushOutcome<T>) {
    match outcome {
        PushOutcome::Buffered | PushOutcome::Spilled => {}
        PushOutcome::DroppedOldest(dropped) => {
            tracing::debug!(buffer, dropped = ?dropped, "Event buffer full, dropped oldest event");
        }
        PushOutcome::Closed(event) => {
            tracing::debug!(buffer, event = ?event, "Event emitted after termination, discarded");
        }
    }
}

/// Consumer side of an event buffer.
///
/// Clones compete for the same events.
pub struct EventReceiver<T> {
    buffer: BoundedBuffer<T>,
}

impl<T> Clone for EventReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<T: Send + 'static> EventReceiver<T> {
    /// Wait for the next event. `None` once the engine terminated and the
    /// buffer is drained.
    pub async fn recv(&self) -> Option<T> {
        self.buffer.recv().await
    }

    pub fn try_recv(&self) -> Option<T> {
        self.buffer.try_recv()
    }

    /// Everything buffered right now, oldest first.
    pub fn drain(&self) -> Vec<T> {
        std::iter::from_fn(|| self.buffer.try_recv()).collect()
    }

    pub fn into_stream(self) -> BoxStream<'static, T> {
        stream::unfold(self.buffer, |buffer| async move {
            buffer.recv().await.map(|event| (event, buffer))
        })
        .boxed()
    }
}

/// Handle for screen code emitting events outside the reduction step.
pub struct EventEmitter<E> {
    dispatcher: EventDispatcher<E>,
}

impl<E> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<E: UiEvent> EventEmitter<E> {
    pub fn emit(&self, event: E) {
        self.dispatcher.emit(event);
    }

    pub fn emit_common(&self, event: CommonUiEvent) {
        self.dispatcher.emit_common(event);
    }
}
