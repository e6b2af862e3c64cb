//! Client Module
//!
//! HTTP protocol handling and the auth client built on top of it.
//!
//! # Endpoints consumed
//! - `GET /` - Service identity and version
//! - `GET /api/V2/token` - Owner of the token in the `Authorization` header
//! - `GET /api/V2/users/?list=a,b` - The subset of listed usernames that exist

mod auth_client;
pub mod protocol;

pub use auth_client::{AuthClient, AuthClientBuilder, CacheReport, SERVICE_NAME};
