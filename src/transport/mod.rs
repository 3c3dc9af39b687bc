//! Remote procedure transport.
//!
//! The controller talks to the backend only through the `Transport` trait:
//! a JSON body is posted to a name-addressed procedure and the decoded
//! payload comes back. `HttpTransport` is the production implementation;
//! tests substitute their own.

mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Fallback shown when the backend does not declare an error type.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Errors produced by a remote procedure call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The backend answered with a non-success status
    #[error("{method} failed: {}{}", kind_or_unknown(.exc_type), message_suffix(.message))]
    Rejected {
        /// Procedure name
        method: String,
        /// HTTP status code
        status: u16,
        /// Declared error type (`exc_type`), if any
        exc_type: Option<String>,
        /// Declared error message (`_error_message`), if any
        message: Option<String>,
    },

    /// The request never produced a response
    #[error("{method} failed: {message}")]
    Network {
        /// Procedure name or URL
        method: String,
        /// Underlying error text
        message: String,
    },

    /// The response body could not be decoded
    #[error("{method} returned an unreadable response: {message}")]
    Decode {
        /// Procedure name
        method: String,
        /// Decoder error text
        message: String,
    },

    /// The request arguments could not be encoded
    #[error("{method} arguments could not be encoded: {message}")]
    InvalidRequest {
        /// Procedure name
        method: String,
        /// Encoder error text
        message: String,
    },
}

fn kind_or_unknown(kind: &Option<String>) -> &str {
    kind.as_deref().unwrap_or(UNKNOWN_ERROR)
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!("\n{}", m))
        .unwrap_or_default()
}

impl RemoteError {
    /// Create a rejection error.
    pub fn rejected(
        method: impl Into<String>,
        status: u16,
        exc_type: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self::Rejected {
            method: method.into(),
            status,
            exc_type,
            message,
        }
    }

    /// Create a network error.
    pub fn network(method: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            method: method.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error.
    pub fn decode(method: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            method: method.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(method: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidRequest {
            method: method.into(),
            message: message.to_string(),
        }
    }

    /// The procedure this error belongs to.
    pub fn method(&self) -> &str {
        match self {
            Self::Rejected { method, .. }
            | Self::Network { method, .. }
            | Self::Decode { method, .. }
            | Self::InvalidRequest { method, .. } => method,
        }
    }
}

/// A name-addressed remote procedure endpoint.
#[async_trait(?Send)]
pub trait Transport {
    /// Post `args` to `method` and return the decoded payload.
    async fn call(&self, method: &str, args: Value) -> Result<Value, RemoteError>;

    /// Download raw bytes from a (possibly site-relative) URL.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, RemoteError>;
}

/// Extract the payload from a successful response body.
///
/// Procedures wrap their return value in `message`; document listings
/// (`docs`) and `login` are returned whole.
pub fn decode_success(method: &str, body: &str) -> Result<Value, RemoteError> {
    let mut data: Value =
        serde_json::from_str(body).map_err(|e| RemoteError::decode(method, e))?;

    if data.get("docs").is_some() || method == "login" {
        return Ok(data);
    }
    Ok(data
        .as_object_mut()
        .and_then(|object| object.remove("message"))
        .unwrap_or(Value::Null))
}

/// Build the error for a non-success response body.
///
/// The body is parsed leniently: anything that is not a JSON object simply
/// yields no declared type or message.
pub fn decode_failure(method: &str, status: u16, body: &str) -> RemoteError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let field = |name: &str| parsed.get(name).and_then(Value::as_str).map(str::to_string);

    let error = RemoteError::rejected(method, status, field("exc_type"), field("_error_message"));
    log::error!("❌ {}", error);
    error
}
