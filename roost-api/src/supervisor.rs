use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::cell::{Cell, CellMap};
use crate::errors::ActorError;

/// Category reported for faults raised inside an actor's receive behavior.
pub const ACTOR_CATEGORY: &str = "actor";

/// Category reported for faults that escape a worker's run loop.
pub const THREAD_CATEGORY: &str = "thread";

/// Supervision decision for handling actor failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionDecision {
    /// Resume the actor, keeping its state
    Resume,
    /// Restart the actor, resetting its state
    Restart,
    /// Stop the actor
    Stop,
    /// Escalate the failure to parent
    Escalate,
}

/// Sink notified of every contained fault before any corrective action.
pub trait ErrorHandler: Send + Sync {
    fn notify(&self, error: &ActorError, category: &str, subject: Option<Uuid>);
}

/// Decides the fate of a cell after an actor-level fault.
pub trait FailureStrategy: Send + Sync {
    fn handle(&self, cell: &Arc<dyn Cell>, error: &ActorError);
}

/// Error handler writing every fault to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn notify(&self, error: &ActorError, category: &str, subject: Option<Uuid>) {
        match subject {
            Some(id) => error!(category, subject = %id, error = %error, "fault reported"),
            None => error!(category, error = %error, "fault reported"),
        }
    }
}

/// Keeps the failed actor running with its current state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResumeStrategy;

impl FailureStrategy for ResumeStrategy {
    fn handle(&self, cell: &Arc<dyn Cell>, error: &ActorError) {
        debug!(actor = %cell.id(), error = %error, "resuming actor after failure");
    }
}

/// Decision function mapping a fault to a supervision decision.
#[derive(Clone)]
pub struct BasicDecisionFn(Arc<dyn Fn(&ActorError) -> SupervisionDecision + Send + Sync>);

impl Debug for BasicDecisionFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BasicDecisionFn(<function>)")
    }
}

impl BasicDecisionFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ActorError) -> SupervisionDecision + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn decide(&self, error: &ActorError) -> SupervisionDecision {
        (self.0)(error)
    }
}

/// Applies a [`SupervisionDecision`] to the failed cell.
///
/// Stopping removes the cell from the registry, after which envelopes still
/// addressed to it are dropped by the workers. There is no parent at this
/// level, so an escalation stops the cell as well.
#[derive(Debug)]
pub struct DecisionStrategy {
    decide: BasicDecisionFn,
    registry: Arc<CellMap>,
}

impl DecisionStrategy {
    pub fn new(decide: BasicDecisionFn, registry: Arc<CellMap>) -> Self {
        Self { decide, registry }
    }
}

impl FailureStrategy for DecisionStrategy {
    fn handle(&self, cell: &Arc<dyn Cell>, error: &ActorError) {
        let id = cell.id();
        match self.decide.decide(error) {
            SupervisionDecision::Resume => debug!(actor = %id, "resuming actor after failure"),
            SupervisionDecision::Restart => {
                if let Err(e) = cell.restart() {
                    warn!(actor = %id, error = %e, "restart failed, stopping actor");
                    self.registry.remove(&id);
                }
            }
            SupervisionDecision::Stop | SupervisionDecision::Escalate => {
                warn!(actor = %id, error = %error, "stopping actor after failure");
                self.registry.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellRegistry, CellStats};
    use crate::message::ActorMessage;
    use crate::types::ActorResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Restartable {
        id: Uuid,
        stats: CellStats,
        restarts: AtomicUsize,
    }

    impl Cell for Restartable {
        fn id(&self) -> Uuid {
            self.id
        }

        fn receive(&self, _message: ActorMessage) -> ActorResult<()> {
            Ok(())
        }

        fn stats(&self) -> &CellStats {
            &self.stats
        }

        fn restart(&self) -> ActorResult<()> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn setup() -> (Arc<CellMap>, Arc<Restartable>) {
        let registry = Arc::new(CellMap::new());
        let cell = Arc::new(Restartable {
            id: Uuid::new_v4(),
            stats: CellStats::new(),
            restarts: AtomicUsize::new(0),
        });
        registry.register(cell.clone());
        (registry, cell)
    }

    #[test]
    fn test_decision_restart_keeps_cell() {
        let (registry, cell) = setup();
        let strategy = DecisionStrategy::new(BasicDecisionFn::new(|_| SupervisionDecision::Restart), registry.clone());
        let as_cell: Arc<dyn Cell> = cell.clone();
        strategy.handle(&as_cell, &ActorError::MessageHandlingError("boom".into()));
        assert_eq!(cell.restarts.load(Ordering::SeqCst), 1);
        assert!(registry.lookup(&cell.id).is_some());
    }

    #[test]
    fn test_decision_stop_removes_cell() {
        let (registry, cell) = setup();
        let strategy = DecisionStrategy::new(
            BasicDecisionFn::new(|e| match e {
                ActorError::Panic(_) => SupervisionDecision::Stop,
                _ => SupervisionDecision::Resume,
            }),
            registry.clone(),
        );
        let as_cell: Arc<dyn Cell> = cell.clone();
        strategy.handle(&as_cell, &ActorError::Unhandled(1));
        assert!(registry.contains(&cell.id));
        strategy.handle(&as_cell, &ActorError::Panic("boom".into()));
        assert!(!registry.contains(&cell.id));
    }
}
