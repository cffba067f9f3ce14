//! # Error Types
//!
//! This module defines the errors shared by the message envelope, the
//! dispatch contracts and the actor cells.
//!
//! ## Core Components
//!
//! - `MessageError`: raised synchronously while building, copying or reading
//!   an envelope. These are programming errors on the sender side and are
//!   never retried.
//! - `ActorError`: any fault raised while a destination processes an
//!   envelope, plus the thread-fatal fault reported when a worker loop dies.
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::errors::{ActorError, MessageError};
//!
//! fn describe(error: &ActorError) -> &'static str {
//!     match error {
//!         ActorError::Panic(_) => "handler panicked",
//!         ActorError::Message(MessageError::IllegalPayload(_)) => "payload cannot cross threads",
//!         _ => "handler failed",
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors raised by envelope construction, duplication and payload access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The payload is mutable, offers no duplication capability and is not
    /// a shareable or fault value, so it may not cross a thread boundary.
    #[error("Illegal payload: {0}")]
    IllegalPayload(String),

    /// A typed accessor was used on a payload of another shape.
    #[error("Payload type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The envelope has no destination but the call site requires one.
    #[error("Message has no destination")]
    MissingDestination,

    /// A text payload could not be parsed as JSON.
    #[error("Failed to read JSON payload: {0}")]
    Json(String),
}

/// Core error type for faults raised while an actor processes a message.
#[derive(Error, Debug)]
pub enum ActorError {
    /// The handler returned an error of its own.
    #[error("Message handling failed: {0}")]
    MessageHandlingError(String),

    /// The handler panicked. The payload of the panic is kept as text.
    #[error("Actor panicked: {0}")]
    Panic(String),

    /// The actor received a message it has no behavior for.
    #[error("Unhandled message with tag {0}")]
    Unhandled(i32),

    /// Forwarding or reading the envelope failed.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// A fault escaped the worker loop itself rather than a single dispatch.
    #[error("Worker thread failed: {0}")]
    ThreadFatal(String),

    /// Catch-all for handler errors from other libraries.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    /// Converts the payload of a caught panic into an `ActorError::Panic`.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        ActorError::Panic(panic_message(payload))
    }
}

/// Extracts a printable message from a panic payload.
pub fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_panic_message_from_str_and_string() {
        let caught = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(caught), "static message");

        let caught = panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(panic_message(caught), "formatted 7");
    }

    #[test]
    fn test_panic_message_unknown_payload() {
        let caught = panic::catch_unwind(|| panic::panic_any(42_u8)).unwrap_err();
        assert!(matches!(ActorError::from_panic(caught), ActorError::Panic(msg) if msg == "unknown panic"));
    }
}
