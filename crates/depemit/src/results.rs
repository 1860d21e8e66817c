//! Values produced by one emission.

use std::fmt;

use indexmap::IndexMap;

use depemit_types::Listener;

/// Listener values collected by an emission, in the order listeners
/// finished.
pub struct EmitResults<A, T> {
    values: IndexMap<Listener<A, T>, T>,
}

impl<A, T> EmitResults<A, T> {
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, listener: Listener<A, T>, value: T) {
        self.values.insert(listener, value);
    }

    /// The value `listener` resolved to, if it ran.
    pub fn get(&self, listener: &Listener<A, T>) -> Option<&T> {
        self.values.get(listener)
    }

    /// Returns `true` if `listener` ran in this emission.
    pub fn contains(&self, listener: &Listener<A, T>) -> bool {
        self.values.contains_key(listener)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Listeners in completion order.
    pub fn listeners(&self) -> impl Iterator<Item = &Listener<A, T>> + '_ {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Listener<A, T>, &T)> + '_ {
        self.values.iter()
    }

    /// Consume the results, keeping only the values in completion order.
    pub fn into_values(self) -> Vec<T> {
        self.values.into_values().collect()
    }
}

impl<A, T> Default for EmitResults<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> IntoIterator for EmitResults<A, T> {
    type Item = (Listener<A, T>, T);
    type IntoIter = indexmap::map::IntoIter<Listener<A, T>, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<A, T: fmt::Debug> fmt::Debug for EmitResults<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}
