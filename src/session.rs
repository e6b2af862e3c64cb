//! Auth Session
//!
//! Configuration-driven entry point that refuses insecure service URLs
//! unless they were explicitly allowed, then delegates to [`AuthClient`].

use std::collections::HashMap;

use url::Url;

use crate::client::AuthClient;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::models::ValidatedToken;

/// A connected auth client built from an [`AuthConfig`].
///
/// Create one per application and share it; clones share the client's caches.
#[derive(Debug, Clone)]
pub struct AuthSession {
    client: AuthClient,
}

impl AuthSession {
    /// Connects to the service named by `config`.
    ///
    /// Fails with `Configuration` when the URL is not `https` and insecure
    /// URLs are not allowed; otherwise errors from the client pass through.
    pub async fn new(config: &AuthConfig) -> Result<Self> {
        let url = &config.auth_server_url;
        if !config.allow_insecure_urls && url.scheme() != "https" {
            return Err(AuthError::Configuration(format!(
                "The URL {} is insecure and insecure URLs are not allowed",
                url
            )));
        }

        let client = AuthClient::builder(url.clone())
            .token_cache(config.token_cache)
            .username_cache(config.username_cache)
            .build()
            .await?;
        Ok(Self { client })
    }

    /// Connects using [`AuthConfig::default`].
    pub async fn with_defaults() -> Result<Self> {
        Self::new(&AuthConfig::default()).await
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn uri(&self) -> &Url {
        self.client.uri()
    }

    /// Validates a token string. See [`AuthClient::validate_token`].
    pub async fn validate_token(&self, token: &str) -> Result<ValidatedToken> {
        self.client.validate_token(token).await
    }

    /// Checks usernames on behalf of an already validated token.
    /// See [`AuthClient::is_valid_user_name`].
    pub async fn is_valid_user_name<S: AsRef<str>>(
        &self,
        usernames: &[S],
        token: &ValidatedToken,
    ) -> Result<HashMap<String, bool>> {
        self.client.is_valid_user_name(usernames, token.token()).await
    }
}
