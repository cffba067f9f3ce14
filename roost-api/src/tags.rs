//! Reserved control tags
//!
//! Tags below zero are reserved for lifecycle directives. They travel in the
//! directive tier so that they preempt ordinary traffic; the supervision
//! layer interprets them, the dispatch core only delivers them.
//!
//! # Usage
//!
//! ```rust
//! use roost_api::tags::{self, ControlTag};
//!
//! assert!(tags::is_control(tags::STOP));
//! assert_eq!(ControlTag::try_from(-4), Ok(ControlTag::Kill));
//! ```

/// Restart the destination actor (-1)
pub const RESTART: i32 = -1;

/// Stop the destination actor (-2)
pub const STOP: i32 = -2;

/// Acknowledges that an actor stopped (-3)
pub const STOP_SUCCESS: i32 = -3;

/// Stop the destination actor without cleanup (-4)
pub const KILL: i32 = -4;

/// Returns true for tags in the reserved control range.
pub fn is_control(tag: i32) -> bool {
    tag < 0
}

/// Typed view over the reserved control tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTag {
    Restart,
    Stop,
    StopSuccess,
    Kill,
}

impl ControlTag {
    pub fn value(self) -> i32 {
        match self {
            ControlTag::Restart => RESTART,
            ControlTag::Stop => STOP,
            ControlTag::StopSuccess => STOP_SUCCESS,
            ControlTag::Kill => KILL,
        }
    }
}

impl TryFrom<i32> for ControlTag {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            RESTART => Ok(ControlTag::Restart),
            STOP => Ok(ControlTag::Stop),
            STOP_SUCCESS => Ok(ControlTag::StopSuccess),
            KILL => Ok(ControlTag::Kill),
            other => Err(other),
        }
    }
}

impl From<ControlTag> for i32 {
    fn from(tag: ControlTag) -> Self {
        tag.value()
    }
}
