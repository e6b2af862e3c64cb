//! Domain and wire models
//!
//! The validated token value object plus the JSON documents exchanged with
//! the auth service.

pub mod responses;
pub mod token;

// Re-export commonly used types
pub use responses::{ErrorDetail, ErrorEnvelope, RootDocument, TokenDocument};
pub use token::ValidatedToken;
