//! Read-only collections that may be shared between actors by reference.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use crate::payload::{Payload, Shareable};

/// A list that can no longer be modified once built.
///
/// The list is only shareable when its elements are, so a list of cells or
/// mutexes cannot be sent by reference:
///
/// ```compile_fail
/// use std::sync::Mutex;
/// use roost_api::immutable::ImmutableList;
/// use roost_api::payload::Payload;
///
/// let list = ImmutableList::new(vec![Mutex::new(1)]);
/// let payload = Payload::from(list);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableList<T>(Vec<T>);

impl<T> ImmutableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    pub fn get(&self) -> &[T] {
        &self.0
    }
}

impl<T> Deref for ImmutableList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> FromIterator<T> for ImmutableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Shareable> Shareable for ImmutableList<T> {}

impl<T: Shareable> From<ImmutableList<T>> for Payload {
    fn from(list: ImmutableList<T>) -> Self {
        Payload::shared(Arc::new(list))
    }
}

/// A map that can no longer be modified once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableMap<K: Eq + Hash, V>(HashMap<K, V>);

impl<K: Eq + Hash, V> ImmutableMap<K, V> {
    pub fn new(map: HashMap<K, V>) -> Self {
        Self(map)
    }

    pub fn get(&self) -> &HashMap<K, V> {
        &self.0
    }
}

impl<K: Eq + Hash, V> Deref for ImmutableMap<K, V> {
    type Target = HashMap<K, V>;

    fn deref(&self) -> &HashMap<K, V> {
        &self.0
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ImmutableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K, V> Shareable for ImmutableMap<K, V>
where
    K: Shareable + Eq + Hash,
    V: Shareable,
{
}

impl<K, V> From<ImmutableMap<K, V>> for Payload
where
    K: Shareable + Eq + Hash,
    V: Shareable,
{
    fn from(map: ImmutableMap<K, V>) -> Self {
        Payload::shared(Arc::new(map))
    }
}
