//! Username Cache Module
//!
//! Remembers usernames the auth service has confirmed exist.

use tokio::sync::Mutex;

use crate::cache::{BoundedTimedCache, CacheStats, EvictionOrder};
use crate::config::CacheSettings;
use crate::error::Result;

// == Username Cache ==
/// Thread-safe set of known-valid usernames. Only presence matters.
///
/// Eviction sweeps drop the least recently read names first.
#[derive(Debug)]
pub struct UsernameCache {
    inner: Mutex<BoundedTimedCache<String, ()>>,
}

impl UsernameCache {
    /// Creates a username cache with the default expiry.
    pub fn new(size: usize, max_size: usize) -> Result<Self> {
        let cache = BoundedTimedCache::new(size, max_size)?
            .with_eviction_order(EvictionOrder::LastTouched);
        Ok(Self {
            inner: Mutex::new(cache),
        })
    }

    pub fn from_settings(settings: &CacheSettings) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(settings.build()?),
        })
    }

    pub async fn put_string(&self, name: &str) {
        self.inner.lock().await.put(name.to_string(), ());
    }

    /// Stores several names under a single lock acquisition.
    pub async fn put_all<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cache = self.inner.lock().await;
        for name in names {
            cache.put(name.into(), ());
        }
    }

    /// Returns true if the name is cached and live, touching it.
    pub async fn has_string(&self, name: &str) -> bool {
        self.inner.lock().await.contains(name)
    }

    pub async fn set_expiry(&self, seconds: u64) -> Result<()> {
        self.inner.lock().await.set_expiry(seconds)
    }

    pub async fn expiry_seconds(&self) -> u64 {
        self.inner.lock().await.expiry_seconds()
    }

    pub async fn purge_expired(&self) -> usize {
        self.inner.lock().await.purge_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }
}
