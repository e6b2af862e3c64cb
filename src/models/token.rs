//! Validated token value object

use std::fmt;

use serde::Serialize;

use crate::error::{AuthError, Result};

/// A token the auth service has confirmed, paired with the user who owns it.
///
/// Equality is by value. The token string is left out of `Debug` output and
/// of serialized forms.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidatedToken {
    #[serde(skip_serializing)]
    token: String,
    user: String,
}

impl ValidatedToken {
    /// Creates a token. Both parts must be non-empty.
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let user = user.into();
        if token.is_empty() {
            return Err(AuthError::invalid("token cannot be null or empty"));
        }
        if user.is_empty() {
            return Err(AuthError::invalid("user cannot be null or empty"));
        }
        Ok(Self { token, user })
    }

    /// Returns the token exactly as it was presented for validation.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_name(&self) -> &str {
        &self.user
    }
}

impl fmt::Debug for ValidatedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedToken")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}
