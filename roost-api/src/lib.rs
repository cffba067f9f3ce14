//! # Roost Actor Runtime API
//!
//! Boundary contracts of the roost dispatch core: what travels between
//! actors, and what the worker threads expect from the rest of the runtime.
//!
//! ## Design Principles
//!
//! - **Explicit copy discipline**: a payload declares up front whether it is
//!   shared, duplicated or refused when it crosses a thread boundary.
//! - **Fault containment**: actor faults are values (`ActorError`) handed to
//!   an error handler and a failure strategy, never thread aborts.
//! - **Thread-free contracts**: nothing in this crate spawns or blocks.
//!
//! ## Core Components
//!
//! - **Messages**: the `ActorMessage` envelope and its `Payload`
//! - **Control tags**: reserved negative tags for lifecycle directives
//! - **Cells**: the runtime object behind an actor id, and its registry
//! - **Supervision**: error handler and failure strategy contracts
//! - **Matcher**: predicate/action rules for building receive behavior
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::{ActorMessage, ActorMessageMatcher};
//! use uuid::Uuid;
//!
//! let mut matcher = ActorMessageMatcher::new();
//! matcher.match_tag(1, |msg| println!("got {}", msg.value));
//!
//! let msg = ActorMessage::new("hello", 1, None, Some(Uuid::new_v4()));
//! assert!(matcher.apply(&msg));
//! ```
//!
//! ## Module Organization
//!
//! - [`message`]: Message envelope and tag ordering
//! - [`payload`]: Payload variants and the copy discipline
//! - [`immutable`]: Shareable read-only collections
//! - [`tags`]: Reserved control tags
//! - [`cell`]: Actor cells, statistics and registries
//! - [`supervisor`]: Error handlers and failure strategies
//! - [`matcher`]: Rule-based message dispatch
//! - [`errors`]: Error types and handling
//! - [`types`]: Common type definitions

pub mod cell;
pub mod errors;
pub mod immutable;
pub mod matcher;
pub mod message;
pub mod payload;
pub mod supervisor;
pub mod tags;
pub mod types;

pub use cell::{Cell, CellMap, CellRegistry, CellStats};
pub use errors::{ActorError, MessageError};
pub use immutable::{ImmutableList, ImmutableMap};
pub use matcher::ActorMessageMatcher;
pub use message::{ActorMessage, ByTag};
pub use payload::{Duplicate, Payload, Shareable};
pub use supervisor::{
    ErrorHandler, FailureStrategy, LoggingErrorHandler, ResumeStrategy, SupervisionDecision,
};
pub use tags::ControlTag;
pub use types::{ActorId, ActorResult};
