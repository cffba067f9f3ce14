use std::fmt;
use std::sync::Mutex;

use tracing::info;
use uuid::Uuid;

use roost_api::message::ActorMessage;
use roost_api::supervisor::THREAD_CATEGORY;

use crate::pattern::Outbox;
use crate::thread::config::ThreadConfig;
use crate::thread::error::{MailboxError, SystemError};
use crate::thread::worker::{current_worker, enqueue_local, ActorThread, DispatchContext, ThreadHandle, WorkerHandle};

/// A fixed set of workers sharing one registry and one failsafe.
///
/// Each destination id maps to exactly one worker, so every envelope for a
/// cell is dispatched on the same thread.
///
/// # Thread Safety
/// - Senders only touch the cross-thread tiers through [`ThreadHandle`]s
/// - A send from a worker to a cell it owns goes to that worker's inner tier
/// - Dropping the pool stops every worker without joining
pub struct ActorThreadPool {
    handles: Vec<ThreadHandle>,
    workers: Mutex<Vec<WorkerHandle>>,
}

impl fmt::Debug for ActorThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorThreadPool")
            .field("size", &self.handles.len())
            .finish_non_exhaustive()
    }
}

impl ActorThreadPool {
    /// Spawns `config.pool_size` workers named `{thread_name_prefix}-{index}`.
    pub fn start(config: &ThreadConfig, context: DispatchContext) -> Result<Self, SystemError> {
        if config.pool_size == 0 {
            return Err(SystemError::NoWorkers);
        }
        config.validate()?;

        let mut handles = Vec::with_capacity(config.pool_size);
        let mut workers = Vec::with_capacity(config.pool_size);
        for index in 0..config.pool_size {
            let name = format!("{}-{}", config.thread_name_prefix, index);
            let spawned = ActorThread::new(name, config, context.clone()).and_then(ActorThread::spawn);
            match spawned {
                Ok(worker) => {
                    handles.push(worker.handle().clone());
                    workers.push(worker);
                }
                Err(e) => {
                    // Do not leak the workers already running
                    for worker in workers {
                        let _ = worker.shutdown();
                    }
                    return Err(e);
                }
            }
        }

        info!(size = config.pool_size, mode = ?config.queue_mode, "thread pool started");
        Ok(Self {
            handles,
            workers: Mutex::new(workers),
        })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Index of the worker that owns `dest`.
    pub fn thread_index(&self, dest: &Uuid) -> usize {
        (dest.as_u128() % self.handles.len() as u128) as usize
    }

    pub fn worker_for(&self, dest: &Uuid) -> &ThreadHandle {
        &self.handles[self.thread_index(dest)]
    }

    pub fn handles(&self) -> &[ThreadHandle] {
        &self.handles
    }

    fn route(&self, message: &ActorMessage) -> Result<&ThreadHandle, MailboxError> {
        let dest = message.dest.ok_or(MailboxError::MissingDestination)?;
        Ok(self.worker_for(&dest))
    }

    /// Sends to the server tier of the destination's worker, or to its inner
    /// tier when called from that worker.
    pub fn send(&self, message: ActorMessage) -> Result<(), MailboxError> {
        let worker = self.route(&message)?;
        if current_worker() == Some(worker.id()) {
            enqueue_local(message)
        } else {
            worker.enqueue_server(message)
        }
    }

    pub fn send_outer(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.route(&message)?.enqueue_outer(message)
    }

    pub fn send_directive(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.route(&message)?.enqueue_directive(message)
    }

    /// Blocks while the destination's priority tier is full, unless called
    /// from that worker, where a full tier fails with `MailboxError::Full`.
    pub fn send_priority(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.route(&message)?.enqueue_priority(message)
    }

    /// Sum of the worker counters.
    pub fn count(&self) -> u64 {
        self.handles.iter().map(ThreadHandle::count).sum()
    }

    pub fn set_processing_time_enabled(&self, enabled: bool) {
        for handle in &self.handles {
            handle.set_processing_time_enabled(enabled);
        }
    }

    /// Stops every worker and waits for it to exit.
    ///
    /// All workers are joined even if one fails; the first failure is
    /// returned. Calling it again is a no-op.
    pub fn shutdown(&self) -> Result<(), SystemError> {
        for handle in &self.handles {
            handle.stop();
        }

        let workers = {
            let mut guard = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        let mut first_error = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                crate::log_fault!(e, THREAD_CATEGORY, "worker did not stop cleanly");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(processed = self.count(), "thread pool stopped");
                Ok(())
            }
        }
    }
}

impl Drop for ActorThreadPool {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.stop();
        }
    }
}

impl Outbox for ActorThreadPool {
    fn send(&self, message: ActorMessage) -> Result<(), MailboxError> {
        ActorThreadPool::send(self, message)
    }
}
