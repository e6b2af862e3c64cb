//! Auth service protocol
//!
//! One GET per call, JSON decoding, and classification of failures into
//! `AuthError` variants.

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::{AuthError, Result};
use crate::models::ErrorEnvelope;

/// Longest response excerpt, in characters, quoted in an error message.
pub const MAX_RESPONSE_LEN: usize = 100;

/// Prefix of errors carrying the service's own message.
pub const SERVICE_ERROR_PREFIX: &str = "Auth service returned an error: ";

/// A decoded JSON object response.
pub type Document = Map<String, Value>;

/// Performs a GET against `target` and returns the decoded JSON object.
///
/// `credential`, when given, is sent verbatim in the `Authorization` header.
/// Only a 200 response counts as success. Any other status becomes a
/// `Protocol` error carrying the service's message when the body is a
/// standard error envelope, or the target, status and an excerpt of the
/// body otherwise.
pub async fn request(
    http: &reqwest::Client,
    target: &Url,
    credential: Option<&str>,
) -> Result<Document> {
    let mut builder = http
        .get(target.clone())
        .header(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(credential) = credential {
        let value = HeaderValue::from_str(credential).map_err(|_| {
            AuthError::invalid("token contains characters that cannot be sent in a header")
        })?;
        builder = builder.header(AUTHORIZATION, value);
    }

    debug!(%target, authenticated = credential.is_some(), "auth service request");

    let transport = |source: reqwest::Error| AuthError::Transport {
        url: target.to_string(),
        source,
    };
    let response = builder.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    classify(target, status, &body)
}

/// Turns a status and body into a document or an error.
pub(crate) fn classify(target: &Url, status: StatusCode, body: &str) -> Result<Document> {
    let document: Document = match serde_json::from_str(body) {
        Ok(document) => document,
        Err(source) => {
            return Err(AuthError::MalformedResponse {
                message: format!(
                    "Failed reading from auth url {} with response code {} - response is not JSON: {}",
                    target,
                    status.as_u16(),
                    truncate(body)
                ),
                source,
            });
        }
    };

    if status == StatusCode::OK {
        return Ok(document);
    }

    match parse_document::<ErrorEnvelope>(document) {
        Ok(envelope) => Err(AuthError::Protocol(format!(
            "{}{}",
            SERVICE_ERROR_PREFIX,
            envelope.error.message_text()
        ))),
        Err(_) => Err(AuthError::Protocol(format!(
            "Unexpected error response from auth url {} with response code {}: {}",
            target,
            status.as_u16(),
            truncate(body)
        ))),
    }
}

/// Deserializes a decoded object into a typed document.
pub fn parse_document<T: DeserializeOwned>(document: Document) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(document))
}

/// Shortens `body` to `MAX_RESPONSE_LEN` characters, ending in `...` when cut.
pub fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_RESPONSE_LEN {
        return body.to_string();
    }
    let mut excerpt: String = body.chars().take(MAX_RESPONSE_LEN - 3).collect();
    excerpt.push_str("...");
    excerpt
}

/// Returns `url` with a path ending in `/`, so relative joins stay beneath it.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
