use std::fmt;

use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;

use roost_api::message::ActorMessage;

use crate::thread::error::MailboxError;
use crate::thread::mailbox::LocalQueue;

/// Fixed-capacity FIFO ring for the bounded worker-local tiers.
///
/// The ring is owned by the worker and used through `&mut self`, so no
/// split into producer and consumer halves is needed. A full ring rejects
/// the new message and keeps the queued ones.
pub struct RingQueue {
    rb: HeapRb<ActorMessage>,
}

impl RingQueue {
    /// # Panics
    ///
    /// Panics if `capacity` is zero; `ThreadConfig::validate` rules that out.
    pub fn new(capacity: usize) -> Self {
        Self {
            rb: HeapRb::new(capacity),
        }
    }
}

impl fmt::Debug for RingQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingQueue")
            .field("len", &self.rb.occupied_len())
            .field("capacity", &self.rb.capacity())
            .finish()
    }
}

impl LocalQueue for RingQueue {
    fn push(&mut self, message: ActorMessage) -> Result<(), MailboxError> {
        self.rb.try_push(message).map_err(|_| MailboxError::Full {
            capacity: self.rb.capacity().get(),
        })
    }

    fn pop(&mut self) -> Option<ActorMessage> {
        self.rb.try_pop()
    }

    fn len(&self) -> usize {
        self.rb.occupied_len()
    }

    fn free_space(&self) -> usize {
        self.rb.vacant_len()
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.rb.capacity().get())
    }
}
