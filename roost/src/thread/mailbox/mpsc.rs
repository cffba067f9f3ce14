use flume::{Receiver, Sender, TrySendError};

use roost_api::message::ActorMessage;

use crate::thread::error::MailboxError;
use crate::thread::mailbox::InboundQueue;

/// A multi-producer, single-consumer L2 tier backed by a flume channel.
///
/// The queue keeps both halves of the channel, so it never disconnects
/// while it is alive. Bounded queues reject when full instead of waiting.
#[derive(Debug)]
pub struct MpscQueue {
    /// The sending half of the channel
    sender: Sender<ActorMessage>,
    /// The receiving half of the channel
    receiver: Receiver<ActorMessage>,
}

impl MpscQueue {
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self { sender, receiver }
    }

    pub fn unbounded() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }
}

impl InboundQueue for MpscQueue {
    fn push(&self, message: ActorMessage) -> Result<(), MailboxError> {
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(MailboxError::Full {
                capacity: self.sender.capacity().unwrap_or_default(),
            }),
            Err(TrySendError::Disconnected(_)) => Err(MailboxError::Closed),
        }
    }

    fn pop(&self) -> Option<ActorMessage> {
        self.receiver.try_recv().ok()
    }

    fn len(&self) -> usize {
        self.receiver.len()
    }

    fn capacity(&self) -> Option<usize> {
        self.sender.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use uuid::Uuid;

    fn msg(tag: i32) -> ActorMessage {
        ActorMessage::new((), tag, None, Some(Uuid::new_v4()))
    }

    #[test]
    fn test_bounded_rejects_when_full() {
        let queue = MpscQueue::bounded(2);
        queue.push(msg(1)).unwrap();
        queue.push(msg(2)).unwrap();
        assert_eq!(queue.push(msg(3)), Err(MailboxError::Full { capacity: 2 }));

        assert_eq!(queue.pop().unwrap().tag, 1);
        assert!(queue.push(msg(3)).is_ok());
    }

    #[test]
    fn test_unbounded_accepts_volume() {
        let queue = MpscQueue::unbounded();
        for tag in 0..100_000 {
            queue.push(msg(tag)).unwrap();
        }
        assert_eq!(queue.len(), 100_000);
        assert_eq!(queue.capacity(), None);
    }

    #[test]
    fn test_per_producer_fifo() {
        let queue = Arc::new(MpscQueue::unbounded());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..1000 {
                        queue.push(msg(p * 10_000 + i)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut last = [-1_i32; 4];
        while let Some(m) = queue.pop() {
            let producer = (m.tag / 10_000) as usize;
            assert!(m.tag % 10_000 > last[producer]);
            last[producer] = m.tag % 10_000;
        }
        assert_eq!(last, [999; 4]);
    }
}
