use crossbeam_queue::SegQueue;

use roost_api::message::ActorMessage;

use crate::thread::error::MailboxError;
use crate::thread::mailbox::InboundQueue;

/// Lock-free unbounded FIFO carrying lifecycle directives.
///
/// Directives are rare and must never be refused, so this tier is unbounded
/// in both layouts.
#[derive(Debug, Default)]
pub struct DirectiveQueue {
    queue: SegQueue<ActorMessage>,
}

impl DirectiveQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InboundQueue for DirectiveQueue {
    fn push(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.queue.push(message);
        Ok(())
    }

    fn pop(&self) -> Option<ActorMessage> {
        self.queue.pop()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}
