//! # Failure Containment
//!
//! Two panic boundaries keep user code from taking a worker down:
//!
//! - Per dispatch: [`Failsafe::dispatch`] runs one `Cell::receive`. A returned
//!   error or a panic is reported under the `"actor"` category with the cell
//!   id, then handed to the failure strategy. The worker carries on with the
//!   next envelope.
//! - Per thread: [`Failsafe::run_guarded`] wraps the whole run loop. A fault
//!   escaping it is reported under the `"thread"` category with the worker id
//!   and ends the thread.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use roost_api::cell::Cell;
use roost_api::errors::{panic_message, ActorError};
use roost_api::message::ActorMessage;
use roost_api::supervisor::{
    ErrorHandler, FailureStrategy, LoggingErrorHandler, ResumeStrategy, ACTOR_CATEGORY,
    THREAD_CATEGORY,
};

/// Fault sinks shared by every worker of a pool.
#[derive(Clone)]
pub struct Failsafe {
    error_handler: Arc<dyn ErrorHandler>,
    failure_strategy: Arc<dyn FailureStrategy>,
}

impl Default for Failsafe {
    fn default() -> Self {
        Self::new(Arc::new(LoggingErrorHandler), Arc::new(ResumeStrategy))
    }
}

impl fmt::Debug for Failsafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failsafe").finish_non_exhaustive()
    }
}

impl Failsafe {
    pub fn new(error_handler: Arc<dyn ErrorHandler>, failure_strategy: Arc<dyn FailureStrategy>) -> Self {
        Self {
            error_handler,
            failure_strategy,
        }
    }

    pub fn error_handler(&self) -> &Arc<dyn ErrorHandler> {
        &self.error_handler
    }

    /// Delivers `message` to `cell`, containing any fault.
    ///
    /// When `timed` is set, the duration of a successful receive is recorded
    /// in the cell's statistics. Returns true on success.
    pub fn dispatch(&self, cell: &Arc<dyn Cell>, message: ActorMessage, timed: bool) -> bool {
        let started = timed.then(Instant::now);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| cell.receive(message)));

        let error = match outcome {
            Ok(Ok(())) => {
                if let Some(started) = started {
                    cell.stats().record_processing_time(started.elapsed());
                }
                return true;
            }
            Ok(Err(error)) => error,
            Err(payload) => ActorError::from_panic(payload),
        };

        self.error_handler.notify(&error, ACTOR_CATEGORY, Some(cell.id()));
        self.failure_strategy.handle(cell, &error);
        false
    }

    /// Runs a worker's main body, converting an escaping panic into a
    /// reported `ActorError::ThreadFatal`.
    pub fn run_guarded<F: FnOnce()>(&self, worker: Uuid, body: F) -> Result<(), ActorError> {
        match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(()) => Ok(()),
            Err(payload) => {
                let error = ActorError::ThreadFatal(panic_message(payload));
                self.error_handler.notify(&error, THREAD_CATEGORY, Some(worker));
                Err(error)
            }
        }
    }
}
