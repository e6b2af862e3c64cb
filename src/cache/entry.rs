//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with age tracking.

use chrono::{DateTime, Duration, Utc};

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was inserted; never changes afterwards
    pub added_at: DateTime<Utc>,
    /// When the entry was last inserted or read
    pub touched_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry added and touched at `now`.
    pub fn new(value: V, now: DateTime<Utc>) -> Self {
        Self {
            value,
            added_at: now,
            touched_at: now,
        }
    }

    // == Touch ==
    /// Records a read at `now`. Leaves `added_at` alone.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        // Clock steps backwards must not break touched_at >= added_at.
        if now > self.touched_at {
            self.touched_at = now;
        }
    }

    // == Is Expired ==
    /// Checks if more than `expiry` has passed since the entry was added.
    ///
    /// Touches do not extend the lifetime. An entry read exactly `expiry`
    /// after insertion is still live.
    pub fn is_expired(&self, expiry: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) > expiry
    }

    // == Age ==
    /// Time since insertion, clamped at zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.added_at).max(Duration::zero())
    }
}
