//! Visited-state trackers.

use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;

/// Records which items a traversal has already visited.
pub trait Tracker<T> {
    fn has_visited(&self, item: &T) -> bool;

    /// Mark `item` visited. Returns `false` if it already was.
    fn visit(&mut self, item: &T) -> bool;

    fn clear(&mut self);
}

/// Tracks items by value.
#[derive(Debug, Clone)]
pub struct BasicTracker<T> {
    visited: HashSet<T>,
}

impl<T> BasicTracker<T> {
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
        }
    }
}

impl<T> Default for BasicTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> Tracker<T> for BasicTracker<T> {
    fn has_visited(&self, item: &T) -> bool {
        self.visited.contains(item)
    }

    fn visit(&mut self, item: &T) -> bool {
        if self.visited.contains(item) {
            return false;
        }
        self.visited.insert(item.clone())
    }

    fn clear(&mut self) {
        self.visited.clear();
    }
}

/// Tracks items by a derived key, for items that are not themselves hashable
/// or that should be considered equal on a subset of their fields.
pub struct KeyedTracker<'a, T, K> {
    key: Rc<dyn Fn(&T) -> K + 'a>,
    visited: HashSet<K>,
}

impl<'a, T, K> KeyedTracker<'a, T, K> {
    pub fn new(key: impl Fn(&T) -> K + 'a) -> Self {
        Self {
            key: Rc::new(key),
            visited: HashSet::new(),
        }
    }
}

impl<T, K> Clone for KeyedTracker<'_, T, K>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            key: Rc::clone(&self.key),
            visited: self.visited.clone(),
        }
    }
}

impl<T, K: Hash + Eq> Tracker<T> for KeyedTracker<'_, T, K> {
    fn has_visited(&self, item: &T) -> bool {
        self.visited.contains(&(self.key)(item))
    }

    fn visit(&mut self, item: &T) -> bool {
        self.visited.insert((self.key)(item))
    }

    fn clear(&mut self) {
        self.visited.clear();
    }
}
