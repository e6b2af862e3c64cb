//! Token Cache Module
//!
//! Remembers tokens the auth service has already vouched for.

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{BoundedTimedCache, CacheStats};
use crate::config::CacheSettings;
use crate::error::{AuthError, Result};
use crate::models::ValidatedToken;

// == Token Cache ==
/// Thread-safe cache of validated tokens keyed by the raw token string.
#[derive(Debug)]
pub struct TokenCache {
    inner: Mutex<BoundedTimedCache<String, ValidatedToken>>,
}

impl TokenCache {
    /// Creates a token cache with the default expiry and eviction order.
    pub fn new(size: usize, max_size: usize) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(BoundedTimedCache::new(size, max_size)?),
        })
    }

    /// Creates a token cache from a full set of cache settings.
    pub fn from_settings(settings: &CacheSettings) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(settings.build()?),
        })
    }

    // == Put Valid Token ==
    /// Stores a token the service has confirmed.
    pub async fn put_valid_token(&self, token: ValidatedToken) {
        let mut cache = self.inner.lock().await;
        cache.put(token.token().to_string(), token);
    }

    // == Get Token ==
    /// Looks up a cached token.
    ///
    /// Returns `Ok(None)` on a miss or when the entry has expired.
    pub async fn get_token(&self, token: &str) -> Result<Option<ValidatedToken>> {
        if token.is_empty() {
            return Err(AuthError::invalid("token cannot be null or empty"));
        }
        let found = self.inner.lock().await.get(token);
        debug!(hit = found.is_some(), "token cache lookup");
        Ok(found)
    }

    pub async fn set_expiry(&self, seconds: u64) -> Result<()> {
        self.inner.lock().await.set_expiry(seconds)
    }

    pub async fn expiry_seconds(&self) -> u64 {
        self.inner.lock().await.expiry_seconds()
    }

    /// Physically removes expired tokens, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.inner.lock().await.purge_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn test_tokens() -> Vec<ValidatedToken> {
        (1..=5)
            .map(|i| ValidatedToken::new(format!("token{}", i), format!("user{}", i)).unwrap())
            .collect()
    }

    #[test]
    fn test_construct_fail() {
        assert_eq!(
            TokenCache::new(0, 1).unwrap_err().to_string(),
            "size and maxsize must be > 0"
        );
        assert_eq!(
            TokenCache::new(3, 3).unwrap_err().to_string(),
            "size must be < maxsize"
        );
    }

    #[tokio::test]
    async fn test_drops_old_tokens_on_resize() {
        let cache = TokenCache::new(2, 4).unwrap();
        let tokens = test_tokens();

        for token in &tokens[..4] {
            cache.put_valid_token(token.clone()).await;
        }
        // Re-adding resets the insertion position
        cache.put_valid_token(tokens[0].clone()).await;
        assert_eq!(
            cache.get_token("token1").await.unwrap(),
            Some(ValidatedToken::new("token1", "user1").unwrap())
        );
        // A read does not
        assert_eq!(
            cache.get_token("token2").await.unwrap(),
            Some(ValidatedToken::new("token2", "user2").unwrap())
        );
        cache.put_valid_token(tokens[4].clone()).await;

        let expected = [true, false, false, false, true];
        for (token, present) in tokens.iter().zip(expected) {
            let found = cache.get_token(token.token()).await.unwrap();
            assert_eq!(found.is_some(), present, "unexpected state for {}", token.token());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_and_get() {
        let cache = Arc::new(TokenCache::new(2, 4).unwrap());
        let mut tasks = JoinSet::new();

        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move {
                for i in 0..50 {
                    let raw = format!("token{}_{}", worker, i);
                    let token = ValidatedToken::new(raw.as_str(), format!("user{}", worker)).unwrap();
                    cache.put_valid_token(token).await;
                    if let Some(found) = cache.get_token(&raw).await.unwrap() {
                        assert_eq!(found.user_name(), format!("user{}", worker));
                    }
                    let entries = cache.stats().await.total_entries;
                    assert!(entries <= 4, "cache grew to {} entries", entries);
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        let stats = cache.stats().await;
        assert!(stats.total_entries <= 4);
        assert_eq!(stats.hits + stats.misses, 400);
    }

    #[tokio::test]
    async fn test_get_token_rejects_empty() {
        let cache = TokenCache::new(2, 3).unwrap();

        let err = cache.get_token("").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "token cannot be null or empty");
    }

    #[tokio::test]
    async fn test_drops_expired_tokens() {
        let cache = TokenCache::new(2, 3).unwrap();
        cache.set_expiry(1).await.unwrap();
        assert_eq!(cache.expiry_seconds().await, 1);

        let tokens = test_tokens();
        cache.put_valid_token(tokens[0].clone()).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        cache.put_valid_token(tokens[1].clone()).await;

        assert_eq!(cache.get_token("token1").await.unwrap(), None);
        assert!(cache.get_token("token2").await.unwrap().is_some());
        assert_eq!(cache.stats().await.expirations, 1);
    }

    #[tokio::test]
    async fn test_from_settings() {
        let settings = CacheSettings::default().with_expiry_seconds(42);
        let cache = TokenCache::from_settings(&settings).unwrap();

        assert_eq!(cache.expiry_seconds().await, 42);
        assert_eq!(cache.purge_expired().await, 0);
    }
}
