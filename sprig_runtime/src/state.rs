// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance component state.
//!
//! ## Overview
//!
//! A [`StateStore`] is a dynamic map from string keys to values of any `'static`
//! type. Reads are typed: asking for a key with the wrong type yields `None`, the
//! same as asking for a key that was never set. Nothing here panics.
//!
//! Components that want compile-time checking declare [`StateKey`] constants and
//! go through [`StateStore::read`] and [`Cx::put`](crate::Cx::put).
//!
//! The store itself never schedules work. Writes made through
//! [`Cx::set`](crate::Cx::set) mark the owning instance dirty and request a render.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;

/// Key/value state owned by one component instance.
///
/// Iteration follows first-insertion order.
#[derive(Default)]
pub struct StateStore {
    values: IndexMap<String, Box<dyn Any>>,
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value under `key`, if present and of type `T`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    /// Mutable access to the value under `key`, if present and of type `T`.
    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut::<T>()
    }

    /// Typed read through a declared key.
    pub fn read<T: 'static>(&self, key: StateKey<T>) -> Option<&T> {
        self.get(key.name)
    }

    /// Store `value` under `key`, replacing any previous value of any type.
    ///
    /// A replaced key keeps its original iteration position.
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Remove a key. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.shift_remove(key).is_some()
    }

    /// Returns true if `key` holds a value of any type.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A typed state key.
///
/// ```
/// use sprig_runtime::{StateKey, StateStore};
///
/// const COUNT: StateKey<u32> = StateKey::new("count");
///
/// let mut state = StateStore::new();
/// state.insert(COUNT.name(), 3_u32);
/// assert_eq!(state.read(COUNT), Some(&3));
/// // The dynamic view sees the same slot.
/// assert_eq!(state.get::<u32>("count"), Some(&3));
/// assert_eq!(state.get::<i64>("count"), None);
/// ```
pub struct StateKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> StateKey<T> {
    /// Declare a key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    /// The underlying string key.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateKey").field(&self.name).finish()
    }
}
