//! Error types for the hcloud-client library
//!
//! The crate error enum covers the full failure taxonomy of a request:
//! transport failures, metadata decode failures, structured API errors,
//! unstructured status-code errors, and destination decode failures.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience type alias for results using the crate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for API operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure: connection, TLS, timeout, cancellation.
    /// Never retried and never reinterpreted.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request could not be constructed.
    #[error("failed to build request: {message}")]
    Build { message: String },

    /// The response claimed to be JSON but its metadata failed to parse.
    #[error("error reading response meta data: {source}")]
    Meta {
        #[source]
        source: serde_json::Error,
    },

    /// Structured error returned by the API.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An error-range response whose body carried no structured error.
    #[error("server responded with status code {status}")]
    Status { status: u16 },

    /// A successful response body failed to decode into the destination type.
    #[error("failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

/// A structured error returned by the API.
///
/// Carries a stable machine-readable [`ErrorCode`], a human-readable
/// message, and, for error codes that define one, a typed details payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

/// Machine-readable error codes returned by the API.
///
/// The set is open: codes this library does not know about are preserved
/// verbatim in [`ErrorCode::Other`]. Only [`ErrorCode::RateLimitExceeded`]
/// is privileged by the client, which retries requests rejected with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// Rate limit exceeded; the client retries these with backoff.
    RateLimitExceeded,
    /// The request contained invalid input; carries field-level details.
    InvalidInput,
    Forbidden,
    Unauthorized,
    NotFound,
    Locked,
    JsonError,
    UniquenessError,
    ResourceLimitExceeded,
    ResourceUnavailable,
    ServiceError,
    TokenReadonly,
    /// Any code this library does not model.
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Locked => "locked",
            ErrorCode::JsonError => "json_error",
            ErrorCode::UniquenessError => "uniqueness_error",
            ErrorCode::ResourceLimitExceeded => "resource_limit_exceeded",
            ErrorCode::ResourceUnavailable => "resource_unavailable",
            ErrorCode::ServiceError => "service_error",
            ErrorCode::TokenReadonly => "token_readonly",
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "rate_limit_exceeded" => ErrorCode::RateLimitExceeded,
            "invalid_input" => ErrorCode::InvalidInput,
            "forbidden" => ErrorCode::Forbidden,
            "unauthorized" => ErrorCode::Unauthorized,
            "not_found" => ErrorCode::NotFound,
            "locked" => ErrorCode::Locked,
            "json_error" => ErrorCode::JsonError,
            "uniqueness_error" => ErrorCode::UniquenessError,
            "resource_limit_exceeded" => ErrorCode::ResourceLimitExceeded,
            "resource_unavailable" => ErrorCode::ResourceUnavailable,
            "service_error" => ErrorCode::ServiceError,
            "token_readonly" => ErrorCode::TokenReadonly,
            _ => ErrorCode::Other(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed details payload of an [`ApiError`], keyed by the error code.
///
/// Error codes without a modeled details shape leave `ApiError::details`
/// unset, so unknown codes never require dynamic inspection at the call
/// site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetails {
    /// Details of an `invalid_input` error: the rejected fields and the
    /// validation messages attached to each.
    InvalidInput { fields: Vec<InvalidInputField> },
}

/// A single rejected field within an `invalid_input` error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidInputField {
    pub name: String,
    pub messages: Vec<String>,
}
