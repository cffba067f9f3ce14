use std::sync::Arc;

use uuid::Uuid;

use roost_api::cell::{Cell, CellStats};
use roost_api::message::ActorMessage;
use roost_api::types::ActorResult;

use super::Outbox;

type Transform = Box<dyn Fn(&ActorMessage) -> ActorResult<ActorMessage> + Send + Sync>;

/// Transforms each message and passes the result on to `next`.
///
/// The forwarded envelope is sourced from the pipe and addressed to `next`
/// whatever the transform set.
pub struct PipeActor {
    id: Uuid,
    stats: CellStats,
    handler: Transform,
    next: Uuid,
    outbox: Arc<dyn Outbox>,
}

impl PipeActor {
    pub fn new<F>(id: Uuid, next: Uuid, outbox: Arc<dyn Outbox>, handler: F) -> Self
    where
        F: Fn(&ActorMessage) -> ActorResult<ActorMessage> + Send + Sync + 'static,
    {
        Self {
            id,
            stats: CellStats::new(),
            handler: Box::new(handler),
            next,
            outbox,
        }
    }

    pub fn next(&self) -> Uuid {
        self.next
    }
}

impl Cell for PipeActor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn receive(&self, message: ActorMessage) -> ActorResult<()> {
        let mut result = (self.handler)(&message)?;
        result.source = Some(self.id);
        result.dest = Some(self.next);
        self.outbox.send(result)?;
        Ok(())
    }

    fn stats(&self) -> &CellStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::error::MailboxError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sent(Mutex<Vec<ActorMessage>>);

    impl Outbox for Sent {
        fn send(&self, message: ActorMessage) -> Result<(), MailboxError> {
            self.0.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[test]
    fn test_transforms_and_readdresses() {
        let sent = Arc::new(Sent::default());
        let (id, next) = (Uuid::new_v4(), Uuid::new_v4());
        let pipe = PipeActor::new(id, next, sent.clone(), |m| {
            Ok(ActorMessage::new(m.value_as_i32()? * 2, m.tag, None, None))
        });

        pipe.receive(ActorMessage::new(21, 3, None, Some(id))).unwrap();
        assert!(pipe.receive(ActorMessage::new("x", 3, None, Some(id))).is_err());

        let sent = sent.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value_as_i32().unwrap(), 42);
        assert_eq!((sent[0].source, sent[0].dest), (Some(id), Some(next)));
    }
}
