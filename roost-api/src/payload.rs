//! # Message Payloads
//!
//! A payload decides how it crosses a thread boundary. Instead of inspecting
//! the runtime type of an arbitrary object, every payload is built as one of
//! a closed set of variants:
//!
//! - `Empty`: no value, duplicates trivially.
//! - `Immutable`: primitives, text, uuids and values explicitly marked
//!   [`Shareable`]. Copies reuse the same reference.
//! - `Duplicable`: values with an explicit [`Duplicate`] capability. Copies
//!   are new instances produced by that capability.
//! - `Fault`: error values. Errors are immutable facts and are shared.
//! - `Opaque`: anything else. Such a payload can be delivered once but any
//!   attempt to copy it fails with [`MessageError::IllegalPayload`].
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::payload::Payload;
//!
//! let text = Payload::from("hello");
//! assert!(text.duplicate().is_ok());
//!
//! let list = Payload::duplicable(vec![1, 2, 3]);
//! assert!(list.duplicate().is_ok());
//!
//! let opaque = Payload::opaque(vec![1, 2, 3]);
//! assert!(opaque.duplicate().is_err());
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::hash::Hash;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use downcast_rs::{impl_downcast, Downcast};
use uuid::Uuid;

use crate::errors::MessageError;

/// Capability to produce an independent copy of a payload value.
///
/// The capability is opt-in. Implement it only for types that own all of
/// their data: a copy must never let two actors reach the same mutable
/// object. Shared pointers such as `Arc<Mutex<_>>` have no implementation,
/// so they cannot be built into a duplicable payload:
///
/// ```compile_fail
/// use std::sync::{Arc, Mutex};
/// use roost_api::payload::Payload;
///
/// let counter = Arc::new(Mutex::new(vec![1]));
/// let payload = Payload::duplicable(counter);
/// ```
///
/// Owned types whose `Clone` is a deep copy can use [`impl_duplicate!`].
pub trait Duplicate: Downcast + Send + fmt::Debug {
    /// Produces a new, independent instance equal to `self`.
    fn duplicate(&self) -> Box<dyn Duplicate>;

    fn payload_type_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn payload_type_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}
impl_downcast!(Duplicate);

/// Implements [`Duplicate`] through `Clone` for owned types.
///
/// # Examples
///
/// ```rust
/// use roost_api::impl_duplicate;
/// use roost_api::payload::Payload;
///
/// #[derive(Debug, Clone)]
/// struct Order {
///     id: u32,
///     items: Vec<String>,
/// }
///
/// impl_duplicate!(Order);
///
/// let payload = Payload::duplicable(Order { id: 1, items: vec![] });
/// assert!(payload.duplicate().is_ok());
/// ```
#[macro_export]
macro_rules! impl_duplicate {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::payload::Duplicate for $ty {
                fn duplicate(&self) -> ::std::boxed::Box<dyn $crate::payload::Duplicate> {
                    ::std::boxed::Box::new(::std::clone::Clone::clone(self))
                }
            }
        )+
    };
}

impl_duplicate!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String, Uuid, ()
);

// Owned collections are duplicable when their elements are.
impl<T: Duplicate + Clone> Duplicate for Vec<T> {
    fn duplicate(&self) -> Box<dyn Duplicate> {
        Box::new(self.clone())
    }
}

impl<T: Duplicate + Clone> Duplicate for VecDeque<T> {
    fn duplicate(&self) -> Box<dyn Duplicate> {
        Box::new(self.clone())
    }
}

impl<T: Duplicate + Clone> Duplicate for Option<T> {
    fn duplicate(&self) -> Box<dyn Duplicate> {
        Box::new(self.clone())
    }
}

impl<T: Duplicate + Clone + Ord> Duplicate for BTreeSet<T> {
    fn duplicate(&self) -> Box<dyn Duplicate> {
        Box::new(self.clone())
    }
}

impl<K, V> Duplicate for HashMap<K, V>
where
    K: Duplicate + Clone + Eq + Hash,
    V: Duplicate + Clone,
{
    fn duplicate(&self) -> Box<dyn Duplicate> {
        Box::new(self.clone())
    }
}

impl<K, V> Duplicate for BTreeMap<K, V>
where
    K: Duplicate + Clone + Ord,
    V: Duplicate + Clone,
{
    fn duplicate(&self) -> Box<dyn Duplicate> {
        Box::new(self.clone())
    }
}

/// Marker for values that are safe to share by reference between threads.
///
/// Implement it only for types without interior mutability.
pub trait Shareable: Any + Send + Sync {}

macro_rules! shareable {
    ($($ty:ty),+ $(,)?) => {
        $(impl Shareable for $ty {})+
    };
}

shareable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    &'static str, Arc<str>, Uuid, ()
);

/// A reference-counted value marked [`Shareable`].
#[derive(Clone)]
pub struct Shared {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Shared {
    pub fn new<T: Shareable>(value: Arc<T>) -> Self {
        Self {
            value,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns true when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Shared) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared").field("type", &self.type_name).finish()
    }
}

/// Well-known immutable values, shallow-copied on every send.
#[derive(Debug, Clone)]
pub enum Immutable {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Text(Arc<str>),
    Uuid(Uuid),
    Shared(Shared),
}

impl Immutable {
    fn type_name(&self) -> &'static str {
        match self {
            Immutable::Bool(_) => "bool",
            Immutable::I8(_) => "i8",
            Immutable::I16(_) => "i16",
            Immutable::I32(_) => "i32",
            Immutable::I64(_) => "i64",
            Immutable::F32(_) => "f32",
            Immutable::F64(_) => "f64",
            Immutable::Char(_) => "char",
            Immutable::Text(_) => "str",
            Immutable::Uuid(_) => "Uuid",
            Immutable::Shared(shared) => shared.type_name,
        }
    }

    fn value_type_id(&self) -> TypeId {
        match self {
            Immutable::Bool(_) => TypeId::of::<bool>(),
            Immutable::I8(_) => TypeId::of::<i8>(),
            Immutable::I16(_) => TypeId::of::<i16>(),
            Immutable::I32(_) => TypeId::of::<i32>(),
            Immutable::I64(_) => TypeId::of::<i64>(),
            Immutable::F32(_) => TypeId::of::<f32>(),
            Immutable::F64(_) => TypeId::of::<f64>(),
            Immutable::Char(_) => TypeId::of::<char>(),
            Immutable::Text(_) => TypeId::of::<str>(),
            Immutable::Uuid(_) => TypeId::of::<Uuid>(),
            Immutable::Shared(shared) => shared.type_id,
        }
    }

    fn primitive_any(&self) -> Option<&dyn Any> {
        match self {
            Immutable::Bool(v) => Some(v as &dyn Any),
            Immutable::I8(v) => Some(v as &dyn Any),
            Immutable::I16(v) => Some(v as &dyn Any),
            Immutable::I32(v) => Some(v as &dyn Any),
            Immutable::I64(v) => Some(v as &dyn Any),
            Immutable::F32(v) => Some(v as &dyn Any),
            Immutable::F64(v) => Some(v as &dyn Any),
            Immutable::Char(v) => Some(v as &dyn Any),
            Immutable::Uuid(v) => Some(v as &dyn Any),
            Immutable::Text(_) | Immutable::Shared(_) => None,
        }
    }
}

/// An error carried as a message payload.
#[derive(Clone)]
pub struct Fault {
    error: Arc<dyn Error + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Fault {
    pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self {
            error: Arc::new(error),
            type_id: TypeId::of::<E>(),
            type_name: type_name::<E>(),
        }
    }

    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error.as_ref()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    pub fn ptr_eq(&self, other: &Fault) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("type", &self.type_name)
            .field("error", &self.error.to_string())
            .finish()
    }
}

/// Payload carried by an [`ActorMessage`](crate::message::ActorMessage).
pub enum Payload {
    Empty,
    Immutable(Immutable),
    Duplicable(Box<dyn Duplicate>),
    Fault(Fault),
    Opaque {
        value: Box<dyn Any + Send>,
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl Payload {
    pub fn duplicable<T: Duplicate>(value: T) -> Self {
        Payload::Duplicable(Box::new(value))
    }

    pub fn shared<T: Shareable>(value: Arc<T>) -> Self {
        Payload::Immutable(Immutable::Shared(Shared::new(value)))
    }

    pub fn fault<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Payload::Fault(Fault::new(error))
    }

    /// Wraps a value with no copy capability. It can be delivered but never
    /// duplicated.
    pub fn opaque<T: Any + Send>(value: T) -> Self {
        Payload::Opaque {
            value: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Copies the payload for another envelope, applying the copy
    /// discipline of its variant.
    pub fn duplicate(&self) -> Result<Payload, MessageError> {
        match self {
            Payload::Empty => Ok(Payload::Empty),
            Payload::Immutable(value) => Ok(Payload::Immutable(value.clone())),
            Payload::Duplicable(value) => Ok(Payload::Duplicable((**value).duplicate())),
            Payload::Fault(fault) => Ok(Payload::Fault(fault.clone())),
            Payload::Opaque { type_name, .. } => {
                Err(MessageError::IllegalPayload((*type_name).to_string()))
            }
        }
    }

    /// Name of the concrete type held by the payload.
    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::Empty => "()",
            Payload::Immutable(value) => value.type_name(),
            Payload::Duplicable(value) => (**value).payload_type_name(),
            Payload::Fault(fault) => fault.type_name,
            Payload::Opaque { type_name, .. } => type_name,
        }
    }

    /// `TypeId` of the concrete value, `None` for an empty payload.
    ///
    /// Text payloads report `str`.
    pub fn value_type_id(&self) -> Option<TypeId> {
        match self {
            Payload::Empty => None,
            Payload::Immutable(value) => Some(value.value_type_id()),
            Payload::Duplicable(value) => Some((**value).payload_type_id()),
            Payload::Fault(fault) => Some(fault.type_id),
            Payload::Opaque { type_id, .. } => Some(*type_id),
        }
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.value_type_id() == Some(TypeId::of::<T>())
    }

    /// Borrows the concrete value of any variant except text and faults.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Empty | Payload::Fault(_) => None,
            Payload::Immutable(Immutable::Shared(shared)) => shared.downcast_ref::<T>(),
            Payload::Immutable(value) => value.primitive_any().and_then(|any| any.downcast_ref::<T>()),
            Payload::Duplicable(value) => (**value).as_any().downcast_ref::<T>(),
            Payload::Opaque { value, .. } => (**value).downcast_ref::<T>(),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Empty
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Empty"),
            Payload::Immutable(value) => f.debug_tuple("Immutable").field(value).finish(),
            Payload::Duplicable(value) => f.debug_tuple("Duplicable").field(value).finish(),
            Payload::Fault(fault) => f.debug_tuple("Fault").field(fault).finish(),
            Payload::Opaque { type_name, .. } => f.debug_struct("Opaque").field("type", type_name).finish(),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("null"),
            Payload::Immutable(Immutable::Bool(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::I8(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::I16(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::I32(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::I64(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::F32(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::F64(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::Char(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::Text(v)) => write!(f, "{v}"),
            Payload::Immutable(Immutable::Uuid(v)) => write!(f, "{v}"),
            Payload::Fault(fault) => write!(f, "{}", fault.error),
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}

macro_rules! immutable_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Payload::Immutable(Immutable::$variant(value))
                }
            }
        )*
    };
}

immutable_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    char => Char,
    Uuid => Uuid,
    Arc<str> => Text,
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Immutable(Immutable::Text(Arc::from(value)))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Immutable(Immutable::Text(Arc::from(value)))
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Config {
        name: String,
    }

    impl Shareable for Config {}

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn test_text_duplicate_reuses_reference() {
        let payload = Payload::from("hello");
        let copy = payload.duplicate().unwrap();
        match (&payload, &copy) {
            (Payload::Immutable(Immutable::Text(a)), Payload::Immutable(Immutable::Text(b))) => {
                assert!(Arc::ptr_eq(a, b));
            }
            _ => panic!("expected text payloads"),
        }
    }

    #[test]
    fn test_shared_duplicate_reuses_reference() {
        let payload = Payload::shared(Arc::new(Config { name: "cfg".into() }));
        let copy = payload.duplicate().unwrap();
        match (&payload, &copy) {
            (Payload::Immutable(Immutable::Shared(a)), Payload::Immutable(Immutable::Shared(b))) => {
                assert!(a.ptr_eq(b));
                assert_eq!(b.downcast_ref::<Config>().unwrap().name, "cfg");
            }
            _ => panic!("expected shared payloads"),
        }
    }

    #[test]
    fn test_fault_is_shared() {
        let payload = Payload::fault(DiskFull);
        let copy = payload.duplicate().unwrap();
        match (&payload, &copy) {
            (Payload::Fault(a), Payload::Fault(b)) => {
                assert!(a.ptr_eq(b));
                assert!(b.downcast_ref::<DiskFull>().is_some());
            }
            _ => panic!("expected fault payloads"),
        }
        assert!(copy.is::<DiskFull>());
    }

    #[test]
    fn test_opaque_rejected() {
        let payload = Payload::opaque(vec![1_u8, 2, 3]);
        let err = payload.duplicate().unwrap_err();
        assert!(matches!(err, MessageError::IllegalPayload(name) if name.contains("Vec")));
        // Still readable where it was delivered
        assert_eq!(payload.downcast_ref::<Vec<u8>>().unwrap().len(), 3);
    }

    #[test]
    fn test_duplicable_copy_does_not_alias() {
        let payload = Payload::duplicable(vec![1]);
        let mut copy = payload.duplicate().unwrap();
        if let Payload::Duplicable(value) = &mut copy {
            (**value).downcast_mut::<Vec<i32>>().unwrap().push(99);
        }

        assert_eq!(payload.downcast_ref::<Vec<i32>>(), Some(&vec![1]));
        assert_eq!(copy.downcast_ref::<Vec<i32>>(), Some(&vec![1, 99]));
    }

    #[test]
    fn test_shared_mutable_handle_is_never_copied() {
        use std::sync::Mutex;

        let state = Arc::new(Mutex::new(vec![1]));
        let payload = Payload::opaque(Arc::clone(&state));
        assert!(matches!(payload.duplicate(), Err(MessageError::IllegalPayload(name)) if name.contains("Mutex")));
        assert_eq!(Arc::strong_count(&state), 2);
    }

    #[test]
    fn test_type_identity() {
        assert!(Payload::from(5_i32).is::<i32>());
        assert!(Payload::from("x").is::<str>());
        assert!(Payload::duplicable(vec![1]).is::<Vec<i32>>());
        assert!(!Payload::duplicable(vec![1]).is::<Vec<i64>>());
        assert!(Payload::Empty.value_type_id().is_none());
        assert_eq!(Payload::from(3_i64).downcast_ref::<i64>(), Some(&3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Payload::from(42_i32).to_string(), "42");
        assert_eq!(Payload::Empty.to_string(), "null");
        assert_eq!(Payload::fault(DiskFull).to_string(), "disk full");
    }
}
