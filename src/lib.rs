//! Auth2 Client - validates bearer tokens and usernames against a remote
//! authentication service
//!
//! Answers repeat questions from bounded, time-aware in-process caches.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;

pub use client::{AuthClient, AuthClientBuilder};
pub use config::{AuthConfig, CacheSettings};
pub use error::{AuthError, Result};
pub use models::ValidatedToken;
pub use session::AuthSession;
