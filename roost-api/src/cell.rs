//! # Actor Cells
//!
//! A cell is the runtime object representing one live actor. The dispatch
//! core looks cells up by destination id and calls [`Cell::receive`] once per
//! envelope; it never registers or removes cells itself.
//!
//! ## Core Components
//!
//! - `Cell`: receive behavior plus per-cell statistics.
//! - `CellStats`: request-rate counter and processing-time figures, updated by
//!   the worker that owns the cell.
//! - `CellRegistry`: read-only lookup contract used by workers.
//! - `CellMap`: a concurrent registry that stays safe for lookups while the
//!   supervision layer registers and removes cells.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;

use crate::message::ActorMessage;
use crate::types::ActorResult;

/// Runtime object representing one live actor.
///
/// A cell is only ever driven by the worker thread it is assigned to, so an
/// implementation with interior mutability sees no contention from dispatch.
pub trait Cell: Send + Sync {
    /// Identifier used as `dest` by senders.
    fn id(&self) -> Uuid;

    /// Processes one envelope. An `Err` or a panic is contained by the
    /// worker and handed to the failure strategy.
    fn receive(&self, message: ActorMessage) -> ActorResult<()>;

    /// Statistics maintained by the dispatching worker.
    fn stats(&self) -> &CellStats;

    /// Resets the actor's state after a failure. The default keeps the state.
    fn restart(&self) -> ActorResult<()> {
        Ok(())
    }
}

/// Counters attributed to one cell.
#[derive(Debug, Default)]
pub struct CellStats {
    request_rate: AtomicU64,
    processed: AtomicU64,
    processing_time_ns: AtomicU64,
    max_processing_time_ns: AtomicU64,
}

impl CellStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.request_rate.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of envelopes routed to the cell since the last reset.
    pub fn request_rate(&self) -> u64 {
        self.request_rate.load(Ordering::Relaxed)
    }

    /// Reads and clears the request-rate counter.
    pub fn take_request_rate(&self) -> u64 {
        self.request_rate.swap(0, Ordering::Relaxed)
    }

    pub fn record_processing_time(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.processing_time_ns.fetch_add(nanos, Ordering::Relaxed);
        self.max_processing_time_ns.fetch_max(nanos, Ordering::Relaxed);
    }

    /// Number of timed dispatches.
    pub fn timed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn mean_processing_time(&self) -> Option<Duration> {
        let count = self.timed_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.processing_time_ns.load(Ordering::Relaxed) / count))
    }

    pub fn max_processing_time(&self) -> Duration {
        Duration::from_nanos(self.max_processing_time_ns.load(Ordering::Relaxed))
    }
}

/// Lookup of live cells by destination id.
pub trait CellRegistry: Send + Sync {
    fn lookup(&self, id: &Uuid) -> Option<Arc<dyn Cell>>;
}

/// Concurrent cell registry backed by a sharded map.
#[derive(Default)]
pub struct CellMap {
    cells: DashMap<Uuid, Arc<dyn Cell>>,
}

impl CellMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cell under its own id, replacing any previous one.
    pub fn register(&self, cell: Arc<dyn Cell>) -> Option<Arc<dyn Cell>> {
        self.cells.insert(cell.id(), cell)
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<dyn Cell>> {
        self.cells.remove(id).map(|(_, cell)| cell)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.cells.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellRegistry for CellMap {
    fn lookup(&self, id: &Uuid) -> Option<Arc<dyn Cell>> {
        self.cells.get(id).map(|entry| Arc::clone(entry.value()))
    }
}

impl fmt::Debug for CellMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellMap").field("cells", &self.cells.len()).finish()
    }
}
