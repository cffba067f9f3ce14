// Logging System for Roost
//
// This module sets up structured logging for the roost workers on top of the
// `tracing` ecosystem. Workers log start and stop at INFO, dropped messages at
// DEBUG and contained faults at ERROR.
//
// # Usage Examples
//
// ## Basic Initialization
//
// ```rust
// use roost::logging;
//
// // Initialize with default settings (INFO level, console output)
// logging::init_default();
//
// // Or initialize with custom settings
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## Development and Production
//
// ```rust
// use roost::logging;
//
// // DEBUG level, colored output, file/line info, TRACE for the workers
// logging::init_development();
//
// // INFO level, JSON lines, no file/line info
// logging::init_production();
// ```
//
// ## Worker Macros
//
// ```rust
// use roost::{log_dispatch, worker_span};
// use uuid::Uuid;
//
// let span = worker_span!("roost-worker-0", Uuid::new_v4());
// let _guard = span.enter();
// log_dispatch!("dropped", Uuid::new_v4(), tag = 3);
// ```

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::{Mutex, Once};
use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the roost logging system
///
/// # Examples
///
/// ```rust
/// use roost::logging::LogConfig;
/// use tracing::Level;
///
/// let custom_config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     target_filters: Some("roost=debug,roost::thread::worker=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id; worker threads are named after
    /// their pool prefix and index
    pub show_thread_info: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

/// Initialize the logging system with the given configuration
///
/// It's safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(
                registry.with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_thread_names(config.show_thread_info),
                ),
            )
        } else {
            Box::new(
                registry.with(
                    fmt::layer()
                        .with_ansi(atty::is(atty::Stream::Stdout))
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_thread_names(config.show_thread_info)
                        .with_thread_ids(config.show_thread_info),
                ),
            )
        };

        set_global_subscriber(subscriber);
    });
}

// Helper function to set the global subscriber
fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Opens a log file in append mode, creating it if it doesn't exist.
///
/// The handle is shared by every event written through the returned writer.
pub fn file_writer(path: &str) -> io::Result<Mutex<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Mutex::new(file))
}

/// Initialize logging with both console and file output
///
/// The file is opened once, before the subscriber is installed, so that a bad
/// path is reported to the caller. Console output respects ANSI detection;
/// file output is plain.
pub fn init_with_file(config: LogConfig, log_file: &str) -> io::Result<()> {
    let writer = file_writer(log_file)?;

    INIT.call_once(move || {
        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// Initialize logging with INFO level and human-readable console output
pub fn init_default() {
    init(LogConfig::default());
}

/// Initialize logging optimized for development environments
///
/// - DEBUG level for all roost modules
/// - TRACE level for the worker run loop
/// - Colorized console output with file/line information
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        json_format: false,
        show_file_line: true,
        show_thread_info: true,
        target_filters: Some("roost=debug,roost::thread::worker=trace".to_string()),
    });
}

/// Initialize logging optimized for production environments
///
/// JSON lines for log aggregators, no file/line information.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        target_filters: None,
    });
}

/// Initialize logging for testing
///
/// Only shows warnings and errors by default to keep test output clean.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        target_filters: None,
    });
}

/// Create a span covering the life of one worker thread
///
/// # Examples
///
/// ```rust
/// use roost::worker_span;
/// use uuid::Uuid;
///
/// let span = worker_span!("roost-worker-0", Uuid::new_v4());
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! worker_span {
    ($name:expr, $worker_id:expr) => {
        tracing::info_span!("worker", name = %$name, id = %$worker_id)
    };
    ($name:expr, $worker_id:expr, $($fields:tt)*) => {
        tracing::info_span!("worker", name = %$name, id = %$worker_id, $($fields)*)
    };
}

/// Log what happened to one envelope on its way to a destination
///
/// # Examples
///
/// ```rust
/// use roost::log_dispatch;
/// use uuid::Uuid;
///
/// log_dispatch!("dropped", Uuid::new_v4());
/// log_dispatch!("dropped", Uuid::new_v4(), tag = 7, reason = "inner tier full");
/// ```
#[macro_export]
macro_rules! log_dispatch {
    ($event:expr, $dest:expr) => {
        tracing::debug!(event = $event, dest = %$dest)
    };
    ($event:expr, $dest:expr, $($fields:tt)*) => {
        tracing::debug!(event = $event, dest = %$dest, $($fields)*)
    };
}

/// Log a fault together with its category
///
/// # Examples
///
/// ```rust
/// use roost::log_fault;
/// use roost_api::errors::ActorError;
///
/// let error = ActorError::ThreadFatal("loop died".to_string());
/// log_fault!(error, "thread");
/// log_fault!(error, "thread", worker = "roost-worker-1");
/// ```
#[macro_export]
macro_rules! log_fault {
    ($error:expr, $category:expr) => {
        tracing::error!(error = %$error, category = $category)
    };
    ($error:expr, $category:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, category = $category, $($fields)*)
    };
}

/// Get the current tracing dispatcher
///
/// Useful when a thread is started before the global subscriber is set.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}

// Re-export the most commonly used tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
