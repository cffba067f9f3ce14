use std::time::Duration;

use crate::thread::error::SystemError;
use crate::thread::mailbox::{BoundedLayout, QueueLayout, UnboundedLayout};

pub const DEFAULT_QUEUE_SIZE: usize = 50_000;
pub const DEFAULT_BUFFER_QUEUE_SIZE: usize = 10_000;
pub const DEFAULT_IDLE_SPINS: u32 = 10_000;
pub const DEFAULT_PARK_TIMEOUT: Duration = Duration::from_millis(1);

// --- Configuration Enums ---

/// Selects the capacity behavior of a worker's queue tiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueueMode {
    /// Server/outer L2 and inner tiers reject when full; the priority tier
    /// blocks its producers.
    #[default]
    Bounded,
    /// No tier ever rejects or blocks.
    Unbounded,
}

impl QueueMode {
    /// Layout that populates the queue tiers for this mode.
    pub fn layout(self) -> &'static dyn QueueLayout {
        match self {
            QueueMode::Bounded => &BoundedLayout,
            QueueMode::Unbounded => &UnboundedLayout,
        }
    }
}

// --- Worker Configuration ---

/// Configuration shared by every worker of a pool.
#[derive(Clone, Debug)]
pub struct ThreadConfig {
    /// Capacity behavior of the queue tiers.
    pub queue_mode: QueueMode,

    /// Capacity of the bounded L2, priority and inner tiers.
    pub queue_size: usize,

    /// Capacity of the L1 working tiers.
    pub buffer_queue_size: usize,

    /// Whether dispatch time is recorded per cell. Can be toggled at runtime.
    pub processing_time_enabled: bool,

    /// Whether the worker counts processed messages.
    pub counter_enabled: bool,

    /// Consecutive empty passes before the worker parks.
    pub idle_spins: u32,

    /// Longest time a parked worker sleeps before polling again.
    pub park_timeout: Duration,

    /// The number of worker threads started by a pool.
    pub pool_size: usize,

    /// Workers are named `{thread_name_prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            queue_mode: QueueMode::Bounded,
            queue_size: DEFAULT_QUEUE_SIZE,
            buffer_queue_size: DEFAULT_BUFFER_QUEUE_SIZE,
            processing_time_enabled: false,
            counter_enabled: true,
            idle_spins: DEFAULT_IDLE_SPINS,
            park_timeout: DEFAULT_PARK_TIMEOUT,
            pool_size: num_cpus::get(),
            thread_name_prefix: "roost-worker".to_string(),
        }
    }
}

impl ThreadConfig {
    pub fn bounded(queue_size: usize, buffer_queue_size: usize) -> Self {
        Self {
            queue_mode: QueueMode::Bounded,
            queue_size,
            buffer_queue_size,
            ..Default::default()
        }
    }

    pub fn unbounded() -> Self {
        Self {
            queue_mode: QueueMode::Unbounded,
            ..Default::default()
        }
    }

    /// Rejects sizes that would leave a tier without capacity.
    pub fn validate(&self) -> Result<(), SystemError> {
        if self.queue_size == 0 {
            return Err(SystemError::ConfigError("queue_size must be positive".to_string()));
        }
        if self.buffer_queue_size == 0 {
            return Err(SystemError::ConfigError("buffer_queue_size must be positive".to_string()));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(SystemError::ConfigError("thread_name_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}
