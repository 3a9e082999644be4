//! Ordered multi-valued maps and read-only snapshots.
//!
//! Query parameters, matrix parameters and path parameters can repeat a key
//! (`?x=1&x=2`, `;x=1;x=2`). [`MultivaluedMap`] keeps both the first-seen key
//! order and the order of repeated values.
//!
//! Collections handed out by the routing context are snapshots. They implement
//! `Deref` for every read and return [`UnsupportedOperation`] from every
//! mutator, so code written against a mutable map fails loudly instead of
//! silently editing a copy.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

/// Returned by every mutating call on a read-only snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported operation: {operation} on a read-only {collection}")]
pub struct UnsupportedOperation {
    /// Name of the rejected operation (e.g. `"add"`)
    pub operation: &'static str,
    /// Kind of collection that rejected it
    pub collection: &'static str,
}

impl UnsupportedOperation {
    fn on_map(operation: &'static str) -> Self {
        Self {
            operation,
            collection: "map",
        }
    }

    fn on_list(operation: &'static str) -> Self {
        Self {
            operation,
            collection: "list",
        }
    }
}

/// Insertion-ordered `String -> Vec<String>` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultivaluedMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultivaluedMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Append `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Prepend `value` to the values of `key`.
    ///
    /// Used when the routing context records path parameters innermost
    /// first: a later (deeper) match must shadow an outer one of the same name.
    pub fn add_first(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.insert(0, value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Replace all values of `key`.
    pub fn put(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((key, values)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.position(key).map(|i| self.entries[i].1.as_slice())
    }

    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze this map into a shareable read-only snapshot.
    pub fn into_immutable(self) -> ImmutableMultivaluedMap {
        ImmutableMultivaluedMap(Arc::new(self))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MultivaluedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MultivaluedMap::new();
        for (k, v) in iter {
            map.add(k, v);
        }
        map
    }
}

/// Read-only view of a [`MultivaluedMap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImmutableMultivaluedMap(Arc<MultivaluedMap>);

impl ImmutableMultivaluedMap {
    pub fn add(&self, _key: &str, _value: &str) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_map("add"))
    }

    pub fn add_first(&self, _key: &str, _value: &str) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_map("add_first"))
    }

    pub fn put(&self, _key: &str, _values: Vec<String>) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_map("put"))
    }

    pub fn remove(&self, _key: &str) -> Result<Vec<String>, UnsupportedOperation> {
        Err(UnsupportedOperation::on_map("remove"))
    }

    pub fn clear(&self) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_map("clear"))
    }

    /// Copy the snapshot into a new, independently mutable map.
    pub fn to_mutable(&self) -> MultivaluedMap {
        MultivaluedMap::clone(&self.0)
    }
}

impl Deref for ImmutableMultivaluedMap {
    type Target = MultivaluedMap;

    fn deref(&self) -> &MultivaluedMap {
        &self.0
    }
}

/// Read-only ordered list snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadOnlyList<T>(Arc<[T]>);

impl<T> ReadOnlyList<T> {
    pub fn push(&self, _item: T) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_list("push"))
    }

    pub fn insert(&self, _index: usize, _item: T) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_list("insert"))
    }

    pub fn remove(&self, _index: usize) -> Result<T, UnsupportedOperation> {
        Err(UnsupportedOperation::on_list("remove"))
    }

    pub fn clear(&self) -> Result<(), UnsupportedOperation> {
        Err(UnsupportedOperation::on_list("clear"))
    }
}

impl<T> From<Vec<T>> for ReadOnlyList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items.into())
    }
}

impl<T> FromIterator<T> for ReadOnlyList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> Deref for ReadOnlyList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnlyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
