//! # Actor Messages
//!
//! This module defines [`ActorMessage`], the envelope exchanged between
//! actors, and [`ByTag`], the ordering used by the priority tier.
//!
//! ## Design Philosophy
//!
//! - Ownership: an envelope is moved into a queue and out to its receiver,
//!   so it is never mutated after enqueue.
//! - Copy discipline: crossing to another receiver goes through
//!   [`ActorMessage::duplicate`], which shares immutable payloads, copies
//!   duplicable ones and rejects the rest.
//! - Strict accessors: typed accessors fail instead of converting.
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::message::ActorMessage;
//! use uuid::Uuid;
//!
//! let dest = Uuid::new_v4();
//! let msg = ActorMessage::new(42, 7, None, Some(dest)).with_protocol("fipa-request");
//!
//! let copy = msg.duplicate().unwrap();
//! assert_eq!(copy.value_as_i32().unwrap(), 42);
//! assert_eq!(copy.protocol.as_deref(), Some("fipa-request"));
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::MessageError;
use crate::payload::{Immutable, Payload};
use crate::tags::ControlTag;

/// Message exchanged between actors.
#[derive(Debug, Default)]
pub struct ActorMessage {
    /// Payload of the message
    pub value: Payload,
    /// Application discriminator, or a control code when negative
    pub tag: i32,
    /// Sender of the message
    pub source: Option<Uuid>,
    /// Destination of the message, required for delivery
    pub dest: Option<Uuid>,
    /// Correlates the messages of one conversation
    pub interaction: Option<Uuid>,
    /// Interaction protocol
    pub protocol: Option<String>,
    /// Knowledge model describing the payload
    pub ontology: Option<String>,
}

impl ActorMessage {
    pub fn new(value: impl Into<Payload>, tag: i32, source: Option<Uuid>, dest: Option<Uuid>) -> Self {
        Self {
            value: value.into(),
            tag,
            source,
            dest,
            ..Default::default()
        }
    }

    /// Builds a directive carrying a lifecycle instruction and no payload.
    pub fn directive(tag: ControlTag, source: Option<Uuid>, dest: Uuid) -> Self {
        Self::new(Payload::Empty, tag.value(), source, Some(dest))
    }

    pub fn with_interaction(mut self, interaction: Uuid) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_ontology(mut self, ontology: impl Into<String>) -> Self {
        self.ontology = Some(ontology.into());
        self
    }

    /// Returns the destination or fails for an unaddressed envelope.
    pub fn require_dest(&self) -> Result<Uuid, MessageError> {
        self.dest.ok_or(MessageError::MissingDestination)
    }

    pub fn is_control(&self) -> bool {
        crate::tags::is_control(self.tag)
    }

    /// Copies the envelope for another receiver.
    ///
    /// Routing metadata is kept as is. The payload is shared, duplicated or
    /// rejected according to its variant.
    pub fn duplicate(&self) -> Result<ActorMessage, MessageError> {
        Ok(ActorMessage {
            value: self.value.duplicate()?,
            tag: self.tag,
            source: self.source,
            dest: self.dest,
            interaction: self.interaction,
            protocol: self.protocol.clone(),
            ontology: self.ontology.clone(),
        })
    }

    /// Copies the envelope and re-addresses the copy.
    pub fn duplicate_to(&self, dest: Uuid) -> Result<ActorMessage, MessageError> {
        let mut copy = self.duplicate()?;
        copy.dest = Some(dest);
        Ok(copy)
    }

    pub fn value_as_bool(&self) -> Result<bool, MessageError> {
        match &self.value {
            Payload::Immutable(Immutable::Bool(v)) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn value_as_i32(&self) -> Result<i32, MessageError> {
        match &self.value {
            Payload::Immutable(Immutable::I32(v)) => Ok(*v),
            other => Err(mismatch("i32", other)),
        }
    }

    pub fn value_as_i64(&self) -> Result<i64, MessageError> {
        match &self.value {
            Payload::Immutable(Immutable::I64(v)) => Ok(*v),
            other => Err(mismatch("i64", other)),
        }
    }

    pub fn value_as_f64(&self) -> Result<f64, MessageError> {
        match &self.value {
            Payload::Immutable(Immutable::F64(v)) => Ok(*v),
            other => Err(mismatch("f64", other)),
        }
    }

    pub fn value_as_str(&self) -> Result<&str, MessageError> {
        match &self.value {
            Payload::Immutable(Immutable::Text(v)) => Ok(&**v),
            other => Err(mismatch("str", other)),
        }
    }

    pub fn value_as_uuid(&self) -> Result<Uuid, MessageError> {
        match &self.value {
            Payload::Immutable(Immutable::Uuid(v)) => Ok(*v),
            other => Err(mismatch("Uuid", other)),
        }
    }

    /// Borrows the payload as `T`, if that is its concrete type.
    pub fn value_ref<T: std::any::Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Parses a text payload holding JSON.
    pub fn read_value<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        let text = self.value_as_str()?;
        serde_json::from_str(text).map_err(|e| MessageError::Json(e.to_string()))
    }
}

fn mismatch(expected: &'static str, found: &Payload) -> MessageError {
    MessageError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

fn fmt_opt<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

impl fmt::Display for ActorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ActorMessage [value={}, tag={}, source={}, dest={}, interaction={}, protocol={}, ontology={}]",
            self.value,
            self.tag,
            fmt_opt(&self.source),
            fmt_opt(&self.dest),
            fmt_opt(&self.interaction),
            fmt_opt(&self.protocol),
            fmt_opt(&self.ontology),
        )
    }
}

/// Orders envelopes by tag only, ascending.
///
/// Source, destination and payload take no part in the comparison, so two
/// envelopes with the same tag are equal under this ordering.
#[derive(Debug)]
pub struct ByTag(pub ActorMessage);

impl ByTag {
    pub fn into_inner(self) -> ActorMessage {
        self.0
    }
}

impl PartialEq for ByTag {
    fn eq(&self, other: &Self) -> bool {
        self.0.tag == other.0.tag
    }
}

impl Eq for ByTag {}

impl PartialOrd for ByTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.tag.cmp(&other.0.tag)
    }
}
