//! Error types for the auth client
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Auth Error Enum ==
/// Unified error type for the auth client.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed caller input
    #[error("{0}")]
    InvalidArgument(String),

    /// The client cannot be built from the supplied configuration
    #[error("{0}")]
    Configuration(String),

    /// The service answered, but with an error or an unexpected document
    #[error("{0}")]
    Protocol(String),

    /// The service answered with a body that is not a JSON object
    #[error("{message}")]
    MalformedResponse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request never produced a readable response
    #[error("Failed communicating with auth url {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl AuthError {
    /// Returns true for errors raised after the service produced a response.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            AuthError::Protocol(_) | AuthError::MalformedResponse { .. }
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        AuthError::InvalidArgument(message.into())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the auth client.
pub type Result<T> = std::result::Result<T, AuthError>;
