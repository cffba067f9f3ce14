use std::collections::VecDeque;

use roost_api::message::ActorMessage;

use crate::thread::error::MailboxError;
use crate::thread::mailbox::LocalQueue;

/// Growable FIFO for the unbounded worker-local tiers.
#[derive(Debug, Default)]
pub struct DequeQueue {
    items: VecDeque<ActorMessage>,
}

impl DequeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
        }
    }
}

impl LocalQueue for DequeQueue {
    fn push(&mut self, message: ActorMessage) -> Result<(), MailboxError> {
        self.items.push_back(message);
        Ok(())
    }

    fn pop(&mut self) -> Option<ActorMessage> {
        self.items.pop_front()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn free_space(&self) -> usize {
        usize::MAX
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}
