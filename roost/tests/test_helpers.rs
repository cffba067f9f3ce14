#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use roost::thread::{QueueMode, ThreadConfig};
use roost_api::cell::{Cell, CellMap, CellStats};
use roost_api::errors::ActorError;
use roost_api::message::ActorMessage;
use roost_api::supervisor::ErrorHandler;
use roost_api::types::ActorResult;
use uuid::Uuid;

/// Tag on which a `RecordingCell` returns an error.
pub const FAIL_TAG: i32 = 900;
/// Tag on which a `RecordingCell` panics.
pub const PANIC_TAG: i32 = 901;

/// Default wait for cross-thread assertions
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// One delivery: destination cell, tag and the name of the dispatching thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub cell: Uuid,
    pub tag: i32,
    pub thread: Option<String>,
}

pub type DeliveryLog = Arc<Mutex<Vec<Delivery>>>;

/// Records every message it receives, failing on `FAIL_TAG` and panicking on
/// `PANIC_TAG`.
pub struct RecordingCell {
    id: Uuid,
    stats: CellStats,
    log: DeliveryLog,
}

impl RecordingCell {
    pub fn new(log: DeliveryLog) -> Self {
        Self {
            id: Uuid::new_v4(),
            stats: CellStats::new(),
            log,
        }
    }
}

impl Cell for RecordingCell {
    fn id(&self) -> Uuid {
        self.id
    }

    fn receive(&self, message: ActorMessage) -> ActorResult<()> {
        match message.tag {
            FAIL_TAG => return Err(ActorError::MessageHandlingError("scripted failure".to_string())),
            PANIC_TAG => panic!("scripted panic"),
            _ => {}
        }
        self.log.lock().unwrap().push(Delivery {
            cell: self.id,
            tag: message.tag,
            thread: std::thread::current().name().map(str::to_string),
        });
        Ok(())
    }

    fn stats(&self) -> &CellStats {
        &self.stats
    }
}

/// Registry holding `count` recording cells sharing one log.
pub fn registry_with(count: usize) -> (Arc<CellMap>, Vec<Uuid>, DeliveryLog) {
    let registry = Arc::new(CellMap::new());
    let log: DeliveryLog = Arc::new(Mutex::new(Vec::new()));
    let ids = (0..count)
        .map(|_| {
            let cell = RecordingCell::new(log.clone());
            let id = cell.id();
            registry.register(Arc::new(cell));
            id
        })
        .collect();
    (registry, ids, log)
}

/// Small tiers so capacity limits are reachable in tests.
pub fn small_config(mode: QueueMode) -> ThreadConfig {
    ThreadConfig {
        queue_mode: mode,
        queue_size: 4,
        buffer_queue_size: 2,
        idle_spins: 100,
        pool_size: 2,
        thread_name_prefix: "roost-test".to_string(),
        ..Default::default()
    }
}

pub fn msg(tag: i32, dest: Uuid) -> ActorMessage {
    ActorMessage::new((), tag, None, Some(dest))
}

/// Error handler that keeps every report.
#[derive(Default)]
pub struct CollectingHandler {
    pub reports: Mutex<Vec<(String, String, Option<Uuid>)>>,
}

impl CollectingHandler {
    pub fn categories(&self) -> Vec<String> {
        self.reports.lock().unwrap().iter().map(|(_, category, _)| category.clone()).collect()
    }
}

impl ErrorHandler for CollectingHandler {
    fn notify(&self, error: &ActorError, category: &str, subject: Option<Uuid>) {
        self.reports
            .lock()
            .unwrap()
            .push((error.to_string(), category.to_string(), subject));
    }
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
