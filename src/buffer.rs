//! Fixed-capacity FIFO buffer with an explicit overflow policy.
//!
//! Producers never wait: [`BoundedBuffer::push`] always returns
//! immediately. What happens when the ring is full is decided by the
//! [`OverflowPolicy`] chosen at construction:
//!
//! - [`OverflowPolicy::DropOldest`]: the oldest buffered item is discarded
//!   to admit the new one. Used where loss is acceptable (UI events).
//! - [`OverflowPolicy::Spill`]: the new item waits in an unbounded
//!   overflow queue behind the ring and is moved in as the consumer drains.
//!   Nothing is lost and FIFO order holds across both queues. Used where
//!   a submission must eventually be delivered (intents).

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Behavior of a full buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    DropOldest,
    Spill,
}

/// Result of a [`BoundedBuffer::push`].
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome<T> {
    /// Stored in the ring.
    Buffered,
    /// Stored; the returned oldest item was discarded to make room.
    DroppedOldest(T),
    /// Ring full; stored in the overflow queue.
    Spilled,
    /// Buffer closed; the item is handed back.
    Closed(T),
}

/// Cloneable handle to a shared bounded buffer.
///
/// All clones see the same items. Consumers compete: every item is
/// delivered to exactly one `recv` call.
pub struct BoundedBuffer<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    capacity: usize,
    policy: OverflowPolicy,
    inner: Mutex<Inner<T>>,
    notify: Notify,
}

struct Inner<T> {
    ring: VecDeque<T>,
    overflow: VecDeque<T>,
    dropped: u64,
    closed: bool,
}

impl<T> Clone for BoundedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BoundedBuffer<T> {
    /// Create a buffer holding at most `capacity` items in its ring.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                capacity,
                policy,
                inner: Mutex::new(Inner {
                    ring: VecDeque::with_capacity(capacity),
                    overflow: VecDeque::new(),
                    dropped: 0,
                    closed: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.shared.policy
    }

    /// Append an item without waiting.
    pub fn push(&self, item: T) -> PushOutcome<T> {
        let outcome = {
            let mut inner = self.shared.inner.lock();
            if inner.closed {
                return PushOutcome::Closed(item);
            }
            if inner.ring.len() < self.shared.capacity && inner.overflow.is_empty() {
                inner.ring.push_back(item);
                PushOutcome::Buffered
            } else {
                match self.shared.policy {
                    OverflowPolicy::DropOldest => {
                        let oldest = inner.ring.pop_front();
                        inner.ring.push_back(item);
                        match oldest {
                            Some(oldest) => {
                                inner.dropped += 1;
                                PushOutcome::DroppedOldest(oldest)
                            }
                            None => PushOutcome::Buffered,
                        }
                    }
                    OverflowPolicy::Spill => {
                        inner.overflow.push_back(item);
                        PushOutcome::Spilled
                    }
                }
            }
        };
        self.shared.notify.notify_one();
        outcome
    }

    /// Take the next item if one is ready.
    pub fn try_recv(&self) -> Option<T> {
        let mut inner = self.shared.inner.lock();
        let item = inner.ring.pop_front()?;
        if let Some(spilled) = inner.overflow.pop_front() {
            inner.ring.push_back(spilled);
        }
        Some(item)
    }

    /// Wait for the next item.
    ///
    /// Returns `None` once the buffer is closed and fully drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            // Register interest before inspecting the queue so a push or close
            // racing with this check still wakes us.
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_recv() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// Stop accepting items. Already buffered items can still be received.
    pub fn close(&self) {
        self.shared.inner.lock().closed = true;
        self.shared.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.inner.lock().closed
    }

    /// Items waiting in the ring and the overflow queue.
    pub fn len(&self) -> usize {
        let inner = self.shared.inner.lock();
        inner.ring.len() + inner.overflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items discarded by the drop-oldest policy since construction.
    pub fn dropped_count(&self) -> u64 {
        self.shared.inner.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_oldest_keeps_newest_items() {
        let buffer = BoundedBuffer::new(3, OverflowPolicy::DropOldest);
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.dropped_count(), 2);
        let drained: Vec<_> = std::iter::from_fn(|| buffer.try_recv()).collect();
        assert_eq!(drained, vec![2, 3, 4]);
    }

    #[test]
    fn drop_oldest_reports_the_dropped_item() {
        let buffer = BoundedBuffer::new(1, OverflowPolicy::DropOldest);
        assert_eq!(buffer.push("a"), PushOutcome::Buffered);
        assert_eq!(buffer.push("b"), PushOutcome::DroppedOldest("a"));
    }

    #[test]
    fn spill_loses_nothing_and_keeps_order() {
        let buffer = BoundedBuffer::new(2, OverflowPolicy::Spill);
        assert_eq!(buffer.push(1), PushOutcome::Buffered);
        assert_eq!(buffer.push(2), PushOutcome::Buffered);
        assert_eq!(buffer.push(3), PushOutcome::Spilled);
        assert_eq!(buffer.push(4), PushOutcome::Spilled);

        assert_eq!(buffer.try_recv(), Some(1));
        // Ring has room again but the overflow queue still holds older items.
        assert_eq!(buffer.push(5), PushOutcome::Spilled);

        let drained: Vec<_> = std::iter::from_fn(|| buffer.try_recv()).collect();
        assert_eq!(drained, vec![2, 3, 4, 5]);
        assert_eq!(buffer.dropped_count(), 0);
    }

    #[test]
    fn closed_buffer_hands_items_back() {
        let buffer = BoundedBuffer::new(4, OverflowPolicy::Spill);
        buffer.push(1);
        buffer.close();
        assert_eq!(buffer.push(2), PushOutcome::Closed(2));
        assert_eq!(buffer.try_recv(), Some(1));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let buffer = BoundedBuffer::<u8>::new(0, OverflowPolicy::DropOldest);
        assert_eq!(buffer.capacity(), 1);
    }

    #[tokio::test]
    async fn recv_waits_for_push() {
        let buffer = BoundedBuffer::new(4, OverflowPolicy::DropOldest);
        let consumer = buffer.clone();
        let task = tokio::spawn(async move { consumer.recv().await });
        tokio::task::yield_now().await;
        buffer.push(42);
        assert_eq!(task.await.ok().flatten(), Some(42));
    }

    #[tokio::test]
    async fn recv_returns_none_after_close_and_drain() {
        let buffer = BoundedBuffer::new(4, OverflowPolicy::DropOldest);
        buffer.push(7);
        buffer.close();
        assert_eq!(buffer.recv().await, Some(7));
        assert_eq!(buffer.recv().await, None);
    }
}
