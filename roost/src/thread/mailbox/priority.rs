use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use roost_api::message::{ActorMessage, ByTag};

use crate::thread::error::MailboxError;
use crate::thread::mailbox::InboundQueue;

#[derive(Debug, Default)]
struct Heap {
    items: BinaryHeap<Reverse<ByTag>>,
    closed: bool,
}

/// Multi-producer priority tier delivering the lowest tag first.
///
/// Envelopes with equal tags come out in no particular order. A bounded
/// queue blocks producers while it is full; [`PriorityQueue::try_push`]
/// and [`PriorityQueue::push_timeout`] give up instead.
#[derive(Debug)]
pub struct PriorityQueue {
    heap: Mutex<Heap>,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl PriorityQueue {
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            heap: Mutex::new(Heap::default()),
            not_full: Condvar::new(),
            capacity,
        }
    }

    // The heap is left consistent by every critical section, so a poisoned
    // lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_full(&self, heap: &Heap) -> bool {
        self.capacity.is_some_and(|capacity| heap.items.len() >= capacity)
    }

    fn full_error(&self) -> MailboxError {
        MailboxError::Full {
            capacity: self.capacity.unwrap_or_default(),
        }
    }

    /// Inserts without waiting, failing with `MailboxError::Full` at capacity.
    pub fn try_push(&self, message: ActorMessage) -> Result<(), MailboxError> {
        let mut heap = self.lock();
        if heap.closed {
            return Err(MailboxError::Closed);
        }
        if self.is_full(&heap) {
            return Err(self.full_error());
        }
        heap.items.push(Reverse(ByTag(message)));
        Ok(())
    }

    /// Inserts, waiting at most `timeout` for space.
    pub fn push_timeout(&self, message: ActorMessage, timeout: Duration) -> Result<(), MailboxError> {
        let deadline = Instant::now() + timeout;
        let mut heap = self.lock();
        loop {
            if heap.closed {
                return Err(MailboxError::Closed);
            }
            if !self.is_full(&heap) {
                heap.items.push(Reverse(ByTag(message)));
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MailboxError::Timeout(timeout));
            }
            heap = self
                .not_full
                .wait_timeout(heap, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Rejects all further pushes and wakes blocked producers.
    ///
    /// Messages already queued can still be popped.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl InboundQueue for PriorityQueue {
    /// Inserts, blocking while a bounded queue is full.
    fn push(&self, message: ActorMessage) -> Result<(), MailboxError> {
        let mut heap = self.lock();
        while !heap.closed && self.is_full(&heap) {
            heap = self.not_full.wait(heap).unwrap_or_else(PoisonError::into_inner);
        }
        if heap.closed {
            return Err(MailboxError::Closed);
        }
        heap.items.push(Reverse(ByTag(message)));
        Ok(())
    }

    fn pop(&self) -> Option<ActorMessage> {
        let popped = self.lock().items.pop();
        if popped.is_some() && self.capacity.is_some() {
            self.not_full.notify_one();
        }
        popped.map(|Reverse(entry)| entry.into_inner())
    }

    fn len(&self) -> usize {
        self.lock().items.len()
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
