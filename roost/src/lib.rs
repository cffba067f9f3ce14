// Roost Worker Runtime
//
// This crate runs actor cells defined against `roost-api` on dedicated worker
// threads. Each worker drains six queue tiers in a fixed precedence and
// contains every fault raised by the cells it dispatches to.

pub mod logging;
pub mod pattern;
pub mod thread;

// Re-export commonly used types
pub use pattern::{Outbox, PipeActor, RouteeHandler, RouterActor};
pub use thread::{
    ActorThread, ActorThreadPool, DispatchContext, Failsafe, MailboxError, QueueMode, SystemError, ThreadConfig,
    ThreadHandle,
};
