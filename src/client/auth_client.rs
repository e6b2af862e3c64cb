//! Auth Client
//!
//! Token validation and username lookup against the auth service, answered
//! from the client's own caches whenever possible.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStats, TokenCache, UsernameCache};
use crate::client::protocol::{self, parse_document, with_trailing_slash};
use crate::config::CacheSettings;
use crate::error::{AuthError, Result};
use crate::models::{RootDocument, TokenDocument, ValidatedToken};

/// `servicename` reported by the root endpoint of a genuine auth service.
pub const SERVICE_NAME: &str = "Authentication Service";

const TOKEN_PATH: &str = "api/V2/token";
const USERS_PATH: &str = "api/V2/users/";

/// Statistics for both of a client's caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheReport {
    pub tokens: CacheStats,
    pub usernames: CacheStats,
}

// == Auth Client ==
/// Client for the auth service.
///
/// Building a client costs a round trip to the service, so create one per
/// application and share it. Clones share the same caches.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    root: Url,
    tokens: Arc<TokenCache>,
    usernames: Arc<UsernameCache>,
}

/// Builder for [`AuthClient`].
#[derive(Debug)]
pub struct AuthClientBuilder {
    root: Url,
    token_cache: CacheSettings,
    username_cache: CacheSettings,
    http: Option<reqwest::Client>,
}

impl AuthClientBuilder {
    pub fn token_cache(mut self, settings: CacheSettings) -> Self {
        self.token_cache = settings;
        self
    }

    pub fn username_cache(mut self, settings: CacheSettings) -> Self {
        self.username_cache = settings;
        self
    }

    /// Uses a caller-configured HTTP client, e.g. one with a request timeout.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Contacts the service at the root URL and builds the client.
    ///
    /// Fails with `Protocol` unless the root endpoint identifies itself as
    /// the auth service. A non-`https` root only logs a warning.
    pub async fn build(self) -> Result<AuthClient> {
        let tokens = TokenCache::from_settings(&self.token_cache)?;
        let usernames = UsernameCache::from_settings(&self.username_cache)?;
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| {
                    AuthError::Configuration(format!("Failed to create HTTP client: {}", e))
                })?,
        };

        if self.root.scheme() != "https" {
            warn!("auth root URI is insecure");
        }

        let document = protocol::request(&http, &self.root, None).await?;
        let root_doc = parse_document::<RootDocument>(document).ok();
        if root_doc.as_ref().and_then(|d| d.servicename.as_deref()) != Some(SERVICE_NAME) {
            return Err(AuthError::Protocol(format!(
                "Service at {} is not the authentication service",
                self.root
            )));
        }

        let root = with_trailing_slash(self.root);
        let version = root_doc
            .and_then(|d| d.version)
            .unwrap_or_else(|| "unknown".to_string());
        info!(%root, %version, "connected to auth service");

        Ok(AuthClient {
            http,
            root,
            tokens: Arc::new(tokens),
            usernames: Arc::new(usernames),
        })
    }
}

impl AuthClient {
    /// Creates a client with default cache settings.
    ///
    /// # Arguments
    /// * `root` - Root URL of the auth service, e.g. `https://ci.kbase.us/services/auth`
    pub async fn connect(root: Url) -> Result<Self> {
        Self::builder(root).build().await
    }

    pub fn builder(root: Url) -> AuthClientBuilder {
        AuthClientBuilder {
            root,
            token_cache: CacheSettings::default(),
            username_cache: CacheSettings::usernames(),
            http: None,
        }
    }

    /// Returns the service root, always ending in `/`.
    pub fn uri(&self) -> &Url {
        &self.root
    }

    // == Server Version ==
    /// Asks the service for its version. Never cached.
    pub async fn server_version(&self) -> Result<String> {
        let document = protocol::request(&self.http, &self.root, None).await?;
        parse_document::<RootDocument>(document)
            .ok()
            .and_then(|d| d.version)
            .ok_or_else(|| {
                AuthError::Protocol(format!(
                    "Auth service at {} did not report a version",
                    self.root
                ))
            })
    }

    // == Validate Token ==
    /// Validates a token and returns it with the name of its owner.
    ///
    /// A cached answer is returned without contacting the service. Otherwise
    /// the trimmed token is sent to the service, and the result is cached
    /// under the token exactly as given.
    pub async fn validate_token(&self, token: &str) -> Result<ValidatedToken> {
        check_token(token)?;
        if let Some(cached) = self.tokens.get_token(token).await? {
            debug!(user = cached.user_name(), "token served from cache");
            return Ok(cached);
        }

        let target = self.endpoint(TOKEN_PATH)?;
        let document = protocol::request(&self.http, &target, Some(token.trim())).await?;
        let info: TokenDocument = parse_document(document).map_err(|e| {
            AuthError::Protocol(format!(
                "Unexpected token response from auth url {}: {}",
                target, e
            ))
        })?;

        if info.user.is_empty() {
            return Err(AuthError::Protocol(format!(
                "Auth service at {} returned an empty user name for a token",
                target
            )));
        }
        let validated = ValidatedToken::new(token, info.user)?;
        self.tokens.put_valid_token(validated.clone()).await;
        Ok(validated)
    }

    // == Is Valid User Name ==
    /// Checks whether usernames belong to existing accounts.
    ///
    /// Names are trimmed and may only contain `a-z`, `0-9` and `_`. Every
    /// name is validated before any lookup is made. Names not already known
    /// are resolved in a single request; no request is sent when every name
    /// is cached. The result maps each trimmed name to its validity.
    pub async fn is_valid_user_name<S: AsRef<str>>(
        &self,
        users: &[S],
        token: &str,
    ) -> Result<HashMap<String, bool>> {
        check_token(token)?;
        if users.is_empty() {
            return Err(AuthError::invalid("users cannot be null or empty"));
        }

        let mut names: Vec<&str> = Vec::with_capacity(users.len());
        for user in users {
            let name = user.as_ref().trim();
            if name.is_empty() {
                return Err(AuthError::invalid(
                    "each user must be a non-whitespace string",
                ));
            }
            if let Some(bad) = invalid_run(name) {
                return Err(AuthError::invalid(format!(
                    "username {} has invalid character: {}",
                    name, bad
                )));
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let mut result = HashMap::with_capacity(names.len());
        let mut unresolved = Vec::new();
        for name in names {
            if self.usernames.has_string(name).await {
                result.insert(name.to_string(), true);
            } else {
                unresolved.push(name);
            }
        }

        if unresolved.is_empty() {
            debug!("all usernames served from cache");
            return Ok(result);
        }

        let mut target = self.endpoint(USERS_PATH)?;
        target.set_query(Some(&format!("list={}", unresolved.join(","))));
        let document = protocol::request(&self.http, &target, Some(token.trim())).await?;

        self.usernames.put_all(document.keys().cloned()).await;
        for name in unresolved {
            result.insert(name.to_string(), document.contains_key(name));
        }
        Ok(result)
    }

    // == Caches ==
    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn username_cache(&self) -> &UsernameCache {
        &self.usernames
    }

    pub async fn cache_stats(&self) -> CacheReport {
        CacheReport {
            tokens: self.tokens.stats().await,
            usernames: self.usernames.stats().await,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.root.join(path).map_err(|e| {
            AuthError::Configuration(format!(
                "Cannot build {} from auth url {}: {}",
                path, self.root, e
            ))
        })
    }
}

fn check_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(AuthError::invalid("token must be a non-whitespace string"));
    }
    Ok(())
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

/// First run of consecutive characters a username may not contain.
fn invalid_run(name: &str) -> Option<&str> {
    let start = name.find(|c: char| !is_username_char(c))?;
    let rest = &name[start..];
    let len = rest.find(is_username_char).unwrap_or(rest.len());
    Some(&rest[..len])
}
