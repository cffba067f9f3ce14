//! # Worker Thread Module
//!
//! An [`ActorThread`] owns one set of queue tiers and drains them on a
//! dedicated OS thread, delivering each envelope to its destination cell.
//!
//! ## Key Concepts
//! - Split ownership: producers hold a cloneable [`ThreadHandle`] that can
//!   only reach the cross-thread tiers. The worker-local tiers belong to the
//!   `ActorThread` value and move with it onto its thread.
//! - Drain pass: each pass takes at most one envelope per tier, in the order
//!   directive, priority, server, outer, inner. Server and outer first refill
//!   their L1 working tier from L2 when it runs empty.
//! - Idle handling: after `idle_spins` empty passes the worker parks with a
//!   timeout; every enqueue unparks it.
//! - Local sends: receive behavior running on a worker can queue envelopes on
//!   that worker's inner tier through [`enqueue_local`].

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, Thread};
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use roost_api::cell::CellRegistry;
use roost_api::errors::ActorError;
use roost_api::message::ActorMessage;

use crate::thread::config::ThreadConfig;
use crate::thread::error::{MailboxError, SystemError};
use crate::thread::failsafe::Failsafe;
use crate::thread::mailbox::{transfer, InboundQueue, LocalTiers, SharedTiers};

thread_local! {
    static CURRENT_WORKER: std::cell::Cell<Option<Uuid>> = const { std::cell::Cell::new(None) };
    static LOCAL_PENDING: RefCell<Vec<ActorMessage>> = const { RefCell::new(Vec::new()) };
    // Free slots and capacity of the inner tier for the dispatch in progress.
    static LOCAL_ROOM: std::cell::Cell<(usize, usize)> = const { std::cell::Cell::new((0, 0)) };
}

/// Id of the worker currently dispatching on this thread.
pub fn current_worker() -> Option<Uuid> {
    CURRENT_WORKER.with(|current| current.get())
}

/// Queues `message` on the inner tier of the worker dispatching on this
/// thread. The envelope lands in the tier once the current dispatch returns.
///
/// Fails with `MailboxError::Full` once the envelopes queued during this
/// dispatch would overflow a bounded inner tier.
pub fn enqueue_local(message: ActorMessage) -> Result<(), MailboxError> {
    admit(&message)?;
    if current_worker().is_none() {
        return Err(MailboxError::NotOnWorker);
    }
    let (free, capacity) = LOCAL_ROOM.with(|room| room.get());
    LOCAL_PENDING.with(|pending| {
        let mut pending = pending.borrow_mut();
        if pending.len() >= free {
            return Err(MailboxError::Full { capacity });
        }
        pending.push(message);
        Ok(())
    })
}

fn admit(message: &ActorMessage) -> Result<(), MailboxError> {
    match message.dest {
        Some(_) => Ok(()),
        None => Err(MailboxError::MissingDestination),
    }
}

// Marks this thread as dispatching for a worker until dropped.
struct LocalScope {
    previous: Option<Uuid>,
}

impl LocalScope {
    fn enter(worker: Uuid) -> Self {
        let previous = CURRENT_WORKER.with(|current| current.replace(Some(worker)));
        Self { previous }
    }
}

impl Drop for LocalScope {
    fn drop(&mut self) {
        CURRENT_WORKER.with(|current| current.set(self.previous));
        LOCAL_ROOM.with(|room| room.set((0, 0)));
    }
}

/// Collaborators a worker dispatches through.
#[derive(Clone)]
pub struct DispatchContext {
    pub registry: Arc<dyn CellRegistry>,
    pub failsafe: Failsafe,
}

impl DispatchContext {
    /// Context with the logging error handler and the resume strategy.
    pub fn new(registry: Arc<dyn CellRegistry>) -> Self {
        Self {
            registry,
            failsafe: Failsafe::default(),
        }
    }

    pub fn with_failsafe(mut self, failsafe: Failsafe) -> Self {
        self.failsafe = failsafe;
        self
    }
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("failsafe", &self.failsafe)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct ThreadShared {
    id: Uuid,
    name: String,
    tiers: SharedTiers,
    counter: AtomicU64,
    running: AtomicBool,
    processing_time_enabled: AtomicBool,
    thread: OnceLock<Thread>,
}

/// Producer side of a worker.
///
/// Every enqueue requires a destination and wakes the worker if it is
/// parked. Clones share the same worker.
#[derive(Clone, Debug)]
pub struct ThreadHandle {
    shared: Arc<ThreadShared>,
}

impl ThreadHandle {
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    fn wake(&self) {
        if let Some(thread) = self.shared.thread.get() {
            thread.unpark();
        }
    }

    fn enqueue(&self, queue: &dyn InboundQueue, message: ActorMessage) -> Result<(), MailboxError> {
        admit(&message)?;
        queue.push(message)?;
        self.wake();
        Ok(())
    }

    pub fn enqueue_directive(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.enqueue(&self.shared.tiers.directive, message)
    }

    /// Blocks while a bounded priority tier is full.
    ///
    /// Called from this worker's own thread it never blocks, since only the
    /// worker itself drains the tier: a full tier fails with
    /// `MailboxError::Full` instead.
    pub fn enqueue_priority(&self, message: ActorMessage) -> Result<(), MailboxError> {
        if current_worker() == Some(self.shared.id) {
            return self.try_enqueue_priority(message);
        }
        self.enqueue(&self.shared.tiers.priority, message)
    }

    pub fn try_enqueue_priority(&self, message: ActorMessage) -> Result<(), MailboxError> {
        admit(&message)?;
        self.shared.tiers.priority.try_push(message)?;
        self.wake();
        Ok(())
    }

    pub fn enqueue_priority_timeout(&self, message: ActorMessage, timeout: Duration) -> Result<(), MailboxError> {
        admit(&message)?;
        self.shared.tiers.priority.push_timeout(message, timeout)?;
        self.wake();
        Ok(())
    }

    pub fn enqueue_server(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.enqueue(self.shared.tiers.server.as_ref(), message)
    }

    pub fn enqueue_outer(&self, message: ActorMessage) -> Result<(), MailboxError> {
        self.enqueue(self.shared.tiers.outer.as_ref(), message)
    }

    /// Messages dispatched successfully so far.
    pub fn count(&self) -> u64 {
        self.shared.counter.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Asks the worker to exit after its current pass.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.wake();
    }

    pub fn set_processing_time_enabled(&self, enabled: bool) {
        self.shared.processing_time_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn directive_len(&self) -> usize {
        self.shared.tiers.directive.len()
    }

    pub fn priority_len(&self) -> usize {
        self.shared.tiers.priority.len()
    }

    /// Length of the server L2 tier.
    pub fn server_len(&self) -> usize {
        self.shared.tiers.server.len()
    }

    /// Length of the outer L2 tier.
    pub fn outer_len(&self) -> usize {
        self.shared.tiers.outer.len()
    }
}

type TerminationHook = Box<dyn FnOnce() + Send>;

/// Owner side of a worker: the local tiers and the run loop.
pub struct ActorThread {
    shared: Arc<ThreadShared>,
    local: LocalTiers,
    context: DispatchContext,
    counter_enabled: bool,
    buffer_queue_size: usize,
    idle_spins: u32,
    park_timeout: Duration,
    on_termination: Option<TerminationHook>,
}

impl fmt::Debug for ActorThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorThread")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

impl ActorThread {
    /// Builds a worker whose tiers follow `config.queue_mode`.
    pub fn new(name: impl Into<String>, config: &ThreadConfig, context: DispatchContext) -> Result<Self, SystemError> {
        config.validate()?;
        let layout = config.queue_mode.layout();

        let shared = Arc::new(ThreadShared {
            id: Uuid::new_v4(),
            name: name.into(),
            tiers: layout.shared_tiers(config),
            counter: AtomicU64::new(0),
            running: AtomicBool::new(true),
            processing_time_enabled: AtomicBool::new(config.processing_time_enabled),
            thread: OnceLock::new(),
        });

        Ok(Self {
            shared,
            local: layout.local_tiers(config),
            context,
            counter_enabled: config.counter_enabled,
            buffer_queue_size: config.buffer_queue_size,
            idle_spins: config.idle_spins,
            park_timeout: config.park_timeout,
            on_termination: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn handle(&self) -> ThreadHandle {
        ThreadHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Registers a callback run once when the worker leaves its run loop,
    /// whether it stopped normally or died from a fault.
    pub fn on_termination<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_termination = Some(Box::new(callback));
    }

    pub fn enqueue_inner(&mut self, message: ActorMessage) -> Result<(), MailboxError> {
        admit(&message)?;
        self.local.inner.push(message)
    }

    pub fn server_l1_len(&self) -> usize {
        self.local.server.len()
    }

    pub fn outer_l1_len(&self) -> usize {
        self.local.outer.len()
    }

    pub fn inner_len(&self) -> usize {
        self.local.inner.len()
    }

    /// Runs one drain pass and returns the number of envelopes dequeued.
    pub fn poll_once(&mut self) -> usize {
        let _scope = LocalScope::enter(self.shared.id);
        let mut polled = 0;

        if let Some(message) = self.shared.tiers.directive.pop() {
            self.deliver(message);
            polled += 1;
        }

        if let Some(message) = self.shared.tiers.priority.pop() {
            self.deliver(message);
            polled += 1;
        }

        if self.local.server.is_empty() {
            transfer(self.shared.tiers.server.as_ref(), self.local.server.as_mut(), self.buffer_queue_size);
        }
        if let Some(message) = self.local.server.pop() {
            self.deliver(message);
            polled += 1;
        }

        if self.local.outer.is_empty() {
            transfer(self.shared.tiers.outer.as_ref(), self.local.outer.as_mut(), self.buffer_queue_size);
        }
        if let Some(message) = self.local.outer.pop() {
            self.deliver(message);
            polled += 1;
        }

        if let Some(message) = self.local.inner.pop() {
            self.deliver(message);
            polled += 1;
        }

        polled
    }

    fn deliver(&mut self, message: ActorMessage) {
        if let Some(dest) = message.dest {
            match self.context.registry.lookup(&dest) {
                Some(cell) => {
                    let inner = &self.local.inner;
                    let room = (inner.free_space(), inner.capacity().unwrap_or(usize::MAX));
                    LOCAL_ROOM.with(|slot| slot.set(room));
                    cell.stats().record_request();
                    let timed = self.shared.processing_time_enabled.load(Ordering::Relaxed);
                    if self.context.failsafe.dispatch(&cell, message, timed) && self.counter_enabled {
                        self.shared.counter.fetch_add(1, Ordering::Relaxed);
                    }
                }
                None => crate::log_dispatch!("dropped", dest, tag = message.tag, reason = "no such cell"),
            }
        }
        self.flush_local();
    }

    // enqueue_local admits no more than the inner tier had room for.
    fn flush_local(&mut self) {
        let pending = LOCAL_PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
        for message in pending {
            let tag = message.tag;
            if let Err(e) = self.local.inner.push(message) {
                warn!(worker = %self.shared.id, tag, error = %e, "inner tier rejected an admitted message");
            }
        }
    }

    fn run_loop(&mut self) {
        let mut idle: u32 = 0;
        while self.shared.running.load(Ordering::Acquire) {
            if self.poll_once() > 0 {
                idle = 0;
                continue;
            }
            idle = idle.saturating_add(1);
            if idle >= self.idle_spins {
                thread::park_timeout(self.park_timeout);
            } else {
                std::hint::spin_loop();
            }
        }
    }

    /// Drains the tiers on the calling thread until stopped.
    ///
    /// The termination callback runs after the loop on both the normal and
    /// the fatal path. Producers blocked on a full priority tier are released
    /// with `MailboxError::Closed`.
    pub fn run(mut self) -> Result<(), ActorError> {
        let id = self.shared.id;
        let _ = self.shared.thread.set(thread::current());
        let span = crate::worker_span!(self.shared.name, id);
        let _guard = span.enter();
        info!("worker started");

        let failsafe = self.context.failsafe.clone();
        let result = failsafe.run_guarded(id, || self.run_loop());

        self.shared.running.store(false, Ordering::Release);
        self.shared.tiers.priority.close();
        if let Some(callback) = self.on_termination.take() {
            callback();
        }

        // A fault was already reported to the error handler by run_guarded
        if result.is_ok() {
            info!(processed = self.shared.counter.load(Ordering::Relaxed), "worker stopped");
        }
        result
    }

    /// Starts the worker on a new OS thread named after the worker.
    pub fn spawn(self) -> Result<WorkerHandle, SystemError> {
        let handle = self.handle();
        let join = thread::Builder::new()
            .name(handle.name().to_string())
            .spawn(move || self.run())
            .map_err(|e| SystemError::ThreadSetupError(format!("Failed to spawn worker thread {}: {}", handle.name(), e)))?;
        debug!(worker = %handle.id(), name = handle.name(), "worker thread spawned");
        Ok(WorkerHandle { handle, join })
    }
}

/// A spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    handle: ThreadHandle,
    join: JoinHandle<Result<(), ActorError>>,
}

impl WorkerHandle {
    pub fn handle(&self) -> &ThreadHandle {
        &self.handle
    }

    /// Stops the worker and waits for its thread to exit.
    pub fn shutdown(self) -> Result<(), SystemError> {
        self.handle.stop();
        self.join()
    }

    /// Waits for the worker thread to exit.
    ///
    /// A worker that died from a thread-level fault is reported as
    /// `SystemError::WorkerPanicked`.
    pub fn join(self) -> Result<(), SystemError> {
        let name = self.handle.name().to_string();
        match self.join.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(SystemError::WorkerPanicked(format!("{}: {}", name, error))),
            Err(payload) => Err(SystemError::WorkerPanicked(format!(
                "{}: {}",
                name,
                roost_api::errors::panic_message(payload)
            ))),
        }
    }
}
