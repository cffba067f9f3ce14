//! Reusable actors built on the matcher and the worker tiers.

use roost_api::message::ActorMessage;

use crate::thread::error::MailboxError;
use crate::thread::worker::ThreadHandle;

pub mod pipe;
pub mod router;

pub use pipe::PipeActor;
pub use router::{RouteeHandler, RouterActor};

/// Where an actor's outgoing envelopes go.
pub trait Outbox: Send + Sync {
    fn send(&self, message: ActorMessage) -> Result<(), MailboxError>;
}

// A single worker takes everything on its server tier.
impl Outbox for ThreadHandle {
    fn send(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.enqueue_server(message)
    }
}
