//! Cache Module
//!
//! Bounded, time-aware caches for validated tokens and known-good usernames.

mod entry;
mod order;
mod stats;
mod store;
mod token;
mod username;


// Re-export public types
pub use entry::CacheEntry;
pub use order::EvictionOrder;
pub(crate) use order::EvictionQueue;
pub use stats::CacheStats;
pub use store::BoundedTimedCache;
pub use token::TokenCache;
pub use username::UsernameCache;

// == Public Constants ==
/// Idle seconds after which an entry expires unless configured otherwise
pub const DEFAULT_EXPIRY_SECONDS: u64 = 300;

/// Default entry count left after an eviction sweep
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Default entry count above which an eviction sweep runs
pub const DEFAULT_CACHE_MAX_SIZE: usize = 2000;
