//! Worker threads and their queue tiers.

pub mod config;
pub mod error;
pub mod failsafe;
pub mod mailbox;
pub mod pool;
pub mod worker;

pub use config::{QueueMode, ThreadConfig};
pub use error::{MailboxError, SystemError};
pub use failsafe::Failsafe;
pub use pool::ActorThreadPool;
pub use worker::{current_worker, enqueue_local, ActorThread, DispatchContext, ThreadHandle, WorkerHandle};
