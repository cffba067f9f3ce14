//! # Queue Tiers
//!
//! Every worker owns six logical queues, drained in a fixed precedence:
//!
//! | tier | written by | ordering |
//! |---|---|---|
//! | directive | any thread | FIFO |
//! | priority | any thread | ascending tag |
//! | server L2 / outer L2 | any thread | FIFO |
//! | server L1 / outer L1 | owning worker | FIFO |
//! | inner | owning worker | FIFO |
//!
//! Cross-thread tiers implement [`InboundQueue`] (`&self`, `Send + Sync`) and
//! live in [`SharedTiers`] behind the worker's handle. Worker-local tiers
//! implement [`LocalQueue`] (`&mut self`) and live in [`LocalTiers`], owned
//! by the worker, so only the owning thread can ever reach them.
//!
//! A [`QueueLayout`] decides the backing of each tier. [`BoundedLayout`]
//! rejects or blocks at capacity; [`UnboundedLayout`] never does.

use std::fmt::Debug;

use roost_api::message::ActorMessage;

use crate::thread::config::ThreadConfig;
use crate::thread::error::MailboxError;

pub mod deque;
pub mod directive;
pub mod mpsc;
pub mod priority;
pub mod ring;

pub use deque::DequeQueue;
pub use directive::DirectiveQueue;
pub use mpsc::MpscQueue;
pub use priority::PriorityQueue;
pub use ring::RingQueue;

/// A queue written by any thread and read by the owning worker.
pub trait InboundQueue: Send + Sync + Debug {
    /// Appends a message, failing with `MailboxError::Full` at capacity.
    fn push(&self, message: ActorMessage) -> Result<(), MailboxError>;

    fn pop(&self) -> Option<ActorMessage>;

    /// Number of queued messages (snapshot in time).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` for an unbounded queue.
    fn capacity(&self) -> Option<usize>;
}

/// A queue only ever touched by its owning worker.
pub trait LocalQueue: Send + Debug {
    /// Appends a message, failing with `MailboxError::Full` at capacity.
    fn push(&mut self, message: ActorMessage) -> Result<(), MailboxError>;

    fn pop(&mut self) -> Option<ActorMessage>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of messages that can still be pushed without rejection.
    fn free_space(&self) -> usize;

    /// `None` for an unbounded queue.
    fn capacity(&self) -> Option<usize>;
}

/// Tiers shared between a worker and its producers.
#[derive(Debug)]
pub struct SharedTiers {
    pub directive: DirectiveQueue,
    pub priority: PriorityQueue,
    pub server: Box<dyn InboundQueue>,
    pub outer: Box<dyn InboundQueue>,
}

/// Tiers owned by a single worker.
#[derive(Debug)]
pub struct LocalTiers {
    pub server: Box<dyn LocalQueue>,
    pub outer: Box<dyn LocalQueue>,
    pub inner: Box<dyn LocalQueue>,
}

/// Populates the queue tiers of one worker.
pub trait QueueLayout: Send + Sync {
    fn shared_tiers(&self, config: &ThreadConfig) -> SharedTiers;

    fn local_tiers(&self, config: &ThreadConfig) -> LocalTiers;
}

/// Fixed-capacity tiers sized by `queue_size` and `buffer_queue_size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedLayout;

impl QueueLayout for BoundedLayout {
    fn shared_tiers(&self, config: &ThreadConfig) -> SharedTiers {
        SharedTiers {
            directive: DirectiveQueue::new(),
            priority: PriorityQueue::bounded(config.queue_size),
            server: Box::new(MpscQueue::bounded(config.queue_size)),
            outer: Box::new(MpscQueue::bounded(config.queue_size)),
        }
    }

    fn local_tiers(&self, config: &ThreadConfig) -> LocalTiers {
        LocalTiers {
            server: Box::new(RingQueue::new(config.buffer_queue_size)),
            outer: Box::new(RingQueue::new(config.buffer_queue_size)),
            inner: Box::new(RingQueue::new(config.queue_size)),
        }
    }
}

/// Growable tiers. L1 tiers start with `buffer_queue_size` slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnboundedLayout;

impl QueueLayout for UnboundedLayout {
    fn shared_tiers(&self, _config: &ThreadConfig) -> SharedTiers {
        SharedTiers {
            directive: DirectiveQueue::new(),
            priority: PriorityQueue::unbounded(),
            server: Box::new(MpscQueue::unbounded()),
            outer: Box::new(MpscQueue::unbounded()),
        }
    }

    fn local_tiers(&self, config: &ThreadConfig) -> LocalTiers {
        LocalTiers {
            server: Box::new(DequeQueue::with_capacity(config.buffer_queue_size)),
            outer: Box::new(DequeQueue::with_capacity(config.buffer_queue_size)),
            inner: Box::new(DequeQueue::new()),
        }
    }
}

/// Moves at most `limit` messages from an L2 tier into its L1 working tier,
/// never more than the L1 tier has room for. Returns the number moved.
pub fn transfer(from: &dyn InboundQueue, to: &mut dyn LocalQueue, limit: usize) -> usize {
    let mut moved = 0;
    while moved < limit && to.free_space() > 0 {
        let Some(message) = from.pop() else { break };
        // free_space was checked, so the push cannot reject
        if to.push(message).is_err() {
            break;
        }
        moved += 1;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn msg(tag: i32) -> ActorMessage {
        ActorMessage::new((), tag, None, Some(Uuid::new_v4()))
    }

    #[test]
    fn test_transfer_respects_l1_space() {
        let l2 = MpscQueue::bounded(10);
        for tag in 0..5 {
            l2.push(msg(tag)).unwrap();
        }
        let mut l1 = RingQueue::new(3);

        assert_eq!(transfer(&l2, &mut l1, 10), 3);
        assert_eq!(l2.len(), 2);
        assert_eq!(l1.pop().unwrap().tag, 0);
        assert_eq!(transfer(&l2, &mut l1, 10), 1);
        let tags: Vec<i32> = std::iter::from_fn(|| l1.pop().map(|m| m.tag)).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_transfer_limit_into_unbounded() {
        let l2 = MpscQueue::unbounded();
        for tag in 0..10 {
            l2.push(msg(tag)).unwrap();
        }
        let mut l1 = DequeQueue::new();
        assert_eq!(transfer(&l2, &mut l1, 4), 4);
        assert_eq!(l1.len(), 4);
        assert_eq!(l2.len(), 6);
    }

    #[test]
    fn test_layout_capacities() {
        let config = ThreadConfig::bounded(8, 4);
        let shared = BoundedLayout.shared_tiers(&config);
        let local = BoundedLayout.local_tiers(&config);
        assert_eq!(shared.server.capacity(), Some(8));
        assert_eq!(shared.priority.capacity(), Some(8));
        assert_eq!(local.server.capacity(), Some(4));
        assert_eq!(local.inner.capacity(), Some(8));

        let shared = UnboundedLayout.shared_tiers(&config);
        let local = UnboundedLayout.local_tiers(&config);
        assert_eq!(shared.outer.capacity(), None);
        assert_eq!(shared.priority.capacity(), None);
        assert_eq!(local.inner.capacity(), None);
    }
}
