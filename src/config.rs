//! Configuration Module
//!
//! Auth service location, transport policy and cache sizing, loadable from
//! environment variables.

use std::env;
use std::hash::Hash;

use url::Url;

use crate::cache::{
    BoundedTimedCache, EvictionOrder, DEFAULT_CACHE_MAX_SIZE, DEFAULT_CACHE_SIZE,
    DEFAULT_EXPIRY_SECONDS,
};
use crate::error::{AuthError, Result};

/// Auth service used when no URL is configured.
pub const DEFAULT_AUTH_URL: &str = "https://ci.kbase.us/services/auth/";

// Path suffixes of older client URLs, removed in this order.
const LOGIN_PATH: &str = "Sessions/Login/";
const LEGACY_PATH: &str = "api/legacy/KBase/";

// == Cache Settings ==
/// Sizing and expiry for one bounded timed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Entry count left after an eviction sweep
    pub size: usize,
    /// Entry count above which an eviction sweep runs
    pub max_size: usize,
    /// Seconds after insertion before an entry expires
    pub expiry_seconds: u64,
    pub eviction_order: EvictionOrder,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_CACHE_SIZE,
            max_size: DEFAULT_CACHE_MAX_SIZE,
            expiry_seconds: DEFAULT_EXPIRY_SECONDS,
            eviction_order: EvictionOrder::default(),
        }
    }
}

impl CacheSettings {
    /// Defaults for the username cache, where a read protects a name from
    /// the next eviction sweep.
    pub fn usernames() -> Self {
        Self::default().with_eviction_order(EvictionOrder::LastTouched)
    }

    pub fn new(size: usize, max_size: usize) -> Self {
        Self {
            size,
            max_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_expiry_seconds(mut self, seconds: u64) -> Self {
        self.expiry_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_eviction_order(mut self, order: EvictionOrder) -> Self {
        self.eviction_order = order;
        self
    }

    /// Builds an empty cache, validating every setting.
    pub(crate) fn build<K, V>(&self) -> Result<BoundedTimedCache<K, V>>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let mut cache = BoundedTimedCache::new(self.size, self.max_size)?
            .with_eviction_order(self.eviction_order);
        cache.set_expiry(self.expiry_seconds)?;
        Ok(cache)
    }
}

// == Auth Config ==
/// Client configuration.
///
/// Changes have no effect on a session that has already been created.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Root URL of the auth service, always ending in `/`
    pub auth_server_url: Url,
    /// Permit `http` service URLs. Only meant for tests.
    pub allow_insecure_urls: bool,
    pub token_cache: CacheSettings,
    pub username_cache: CacheSettings,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_server_url: default_auth_url(),
            allow_insecure_urls: false,
            token_cache: CacheSettings::default(),
            username_cache: CacheSettings::usernames(),
        }
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the auth service URL.
    ///
    /// A trailing `/` is added when missing. URLs of older clients ending in
    /// `Sessions/Login`, `api/legacy/KBase` or `api/legacy/KBase/Sessions/Login`
    /// have that portion removed.
    #[must_use]
    pub fn with_auth_server_url(mut self, url: Url) -> Self {
        self.auth_server_url = strip_legacy_path(url);
        self
    }

    #[must_use]
    pub fn with_allow_insecure_urls(mut self, insecure: bool) -> Self {
        self.allow_insecure_urls = insecure;
        self
    }

    #[must_use]
    pub fn with_token_cache(mut self, settings: CacheSettings) -> Self {
        self.token_cache = settings;
        self
    }

    #[must_use]
    pub fn with_username_cache(mut self, settings: CacheSettings) -> Self {
        self.username_cache = settings;
        self
    }

    /// Creates a config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `AUTH_SERVICE_URL` - Auth service root (default: `DEFAULT_AUTH_URL`)
    /// - `AUTH_ALLOW_INSECURE_URLS` - Permit `http` URLs (default: false)
    /// - `AUTH_TOKEN_CACHE_SIZE` / `AUTH_TOKEN_CACHE_MAX_SIZE` (default: 1000 / 2000)
    /// - `AUTH_TOKEN_CACHE_EXPIRY` - Seconds (default: 300)
    /// - `AUTH_USER_CACHE_SIZE` / `AUTH_USER_CACHE_MAX_SIZE` (default: 1000 / 2000)
    /// - `AUTH_USER_CACHE_EXPIRY` - Seconds (default: 300)
    ///
    /// Unparsable numbers fall back to their defaults; an unparsable URL is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        let mut config = Self::default();
        if let Some(raw) = lookup("AUTH_SERVICE_URL") {
            let url = Url::parse(raw.trim()).map_err(|e| {
                AuthError::Configuration(format!("Invalid AUTH_SERVICE_URL {}: {}", raw, e))
            })?;
            config = config.with_auth_server_url(url);
        }
        config.allow_insecure_urls = lookup("AUTH_ALLOW_INSECURE_URLS")
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(false);

        config.token_cache =
            cache_settings_from(&parsed, "AUTH_TOKEN_CACHE", CacheSettings::default());
        config.username_cache =
            cache_settings_from(&parsed, "AUTH_USER_CACHE", CacheSettings::usernames());
        Ok(config)
    }
}

fn cache_settings_from<F>(parsed: &F, prefix: &str, defaults: CacheSettings) -> CacheSettings
where
    F: Fn(&str) -> Option<u64>,
{
    let sized = |suffix: &str, default: usize| {
        parsed(&format!("{}_{}", prefix, suffix))
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(default)
    };
    CacheSettings {
        size: sized("SIZE", defaults.size),
        max_size: sized("MAX_SIZE", defaults.max_size),
        expiry_seconds: parsed(&format!("{}_EXPIRY", prefix)).unwrap_or(defaults.expiry_seconds),
        eviction_order: defaults.eviction_order,
    }
}

/// Returns the default auth service URL.
pub fn default_auth_url() -> Url {
    Url::parse(DEFAULT_AUTH_URL).expect("DEFAULT_AUTH_URL is a valid URL")
}

fn strip_legacy_path(mut url: Url) -> Url {
    let mut path = url.path().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }
    for suffix in [LOGIN_PATH, LEGACY_PATH] {
        if let Some(stripped) = path.strip_suffix(suffix) {
            path = stripped.to_string();
        }
    }
    url.set_path(&path);
    url
}
