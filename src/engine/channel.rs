//! Inbound intent queue of one engine.

use futures::stream::{self, StreamExt};

use crate::buffer::{BoundedBuffer, OverflowPolicy, PushOutcome};
use crate::error::EngineError;
use crate::mvi::Intent;
use crate::producer::IntentStream;

/// Bounded, ordered intent queue.
///
/// `submit` never waits. With [`OverflowPolicy::Spill`] a submission that
/// does not fit the ring is queued behind it and still reaches the
/// producer; with [`OverflowPolicy::DropOldest`] the oldest pending intent
/// is discarded instead.
pub struct IntentChannel<I> {
    buffer: BoundedBuffer<I>,
}

impl<I> Clone for IntentChannel<I> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<I: Intent> IntentChannel<I> {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            buffer: BoundedBuffer::new(capacity, policy),
        }
    }

    pub fn submit(&self, intent: I) -> Result<(), EngineError> {
        tracing::trace!(intent = ?intent, "send");
        match self.buffer.push(intent) {
            PushOutcome::Buffered => Ok(()),
            PushOutcome::Spilled => {
                tracing::debug!(
                    pending = self.buffer.len(),
                    "Intent buffer full, queued behind ring"
                );
                Ok(())
            }
            PushOutcome::DroppedOldest(dropped) => {
                tracing::warn!(dropped = ?dropped, "Intent buffer full, dropped oldest intent");
                Ok(())
            }
            PushOutcome::Closed(_) => Err(EngineError::Terminated),
        }
    }

    /// Intents in submission order; ends once the channel is closed and drained.
    pub fn stream(&self) -> IntentStream<I> {
        stream::unfold(self.buffer.clone(), |buffer| async move {
            buffer.recv().await.map(|intent| (intent, buffer))
        })
        .boxed()
    }

    pub fn close(&self) {
        self.buffer.close();
    }

    /// Intents waiting to be picked up by the producer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    impl Intent for Ping {}

    #[tokio::test]
    async fn stream_preserves_submission_order() {
        let channel = IntentChannel::new(2, OverflowPolicy::Spill);
        for i in 0..5 {
            channel.submit(Ping(i)).ok();
        }
        channel.close();
        let received: Vec<_> = channel.stream().collect().await;
        assert_eq!(received, (0..5).map(Ping).collect::<Vec<_>>());
    }

    #[test]
    fn submit_after_close_is_rejected() {
        let channel = IntentChannel::new(2, OverflowPolicy::Spill);
        channel.close();
        assert_eq!(channel.submit(Ping(1)), Err(EngineError::Terminated));
    }

    #[test]
    fn drop_oldest_policy_discards_stale_intents() {
        let channel = IntentChannel::new(2, OverflowPolicy::DropOldest);
        for i in 0..4 {
            assert!(channel.submit(Ping(i)).is_ok());
        }
        assert_eq!(channel.pending(), 2);
    }
}
