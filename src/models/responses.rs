//! Response documents returned by the auth service
//!
//! Only the fields the client reads are modelled; anything else in a
//! document is ignored.

use serde::Deserialize;
use serde_json::Value;

/// Body of `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct RootDocument {
    #[serde(default)]
    pub servicename: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Body of `GET /api/V2/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenDocument {
    pub user: String,
}

/// Failure body: `{"error": {"message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<Value>,
}

impl ErrorDetail {
    /// The service's message as text: strings verbatim, other JSON values
    /// in their JSON form, and `null` when absent.
    pub fn message_text(&self) -> String {
        match &self.message {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => "null".to_string(),
        }
    }
}
