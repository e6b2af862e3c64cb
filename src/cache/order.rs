//! Eviction Queue Module
//!
//! Tracks the order in which keys become eviction candidates.

use std::collections::VecDeque;

// == Eviction Order ==
/// Which event moves a key to the back of the eviction line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionOrder {
    /// Only insertion (or overwrite) counts; reads never protect an entry.
    #[default]
    Inserted,
    /// Reads count too, giving least-recently-used eviction.
    LastTouched,
}

// == Eviction Queue ==
/// Ordered list of keys for oldest-first eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Newest
/// - Back = Oldest
#[derive(Debug)]
pub(crate) struct EvictionQueue<K> {
    /// Keys from newest to oldest
    order: VecDeque<K>,
}

impl<K> Default for EvictionQueue<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: PartialEq> EvictionQueue<K> {
    // == Constructor ==
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Newest ==
    /// Marks a key as the newest.
    ///
    /// If key exists, removes it first then adds to front.
    pub fn push_newest(&mut self, key: K) {
        self.remove(&key);
        self.order.push_front(key);
    }

    // == Remove ==
    /// Removes a key from the queue.
    pub fn remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key.
    ///
    /// Returns None if queue is empty.
    pub fn pop_oldest(&mut self) -> Option<K> {
        self.order.pop_back()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    fn peek_oldest(&self) -> Option<&K> {
        self.order.back()
    }
}
