//! Wire shapes of API response bodies
//!
//! The serde structs here mirror the JSON the backend sends; they are
//! converted into the public domain types before leaving the crate.

use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ErrorCode, ErrorDetails, InvalidInputField};
use crate::response::{is_json, Pagination};

/// Error envelope: `{"error": {"code": ..., "message": ..., "details": ...}}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub error: ErrorSchema,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorSchema {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Details payload of an `invalid_input` error.
#[derive(Debug, Deserialize)]
pub(crate) struct InvalidInputDetails {
    #[serde(default)]
    pub fields: Vec<InvalidInputFieldSchema>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvalidInputFieldSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Meta envelope: `{"meta": {"pagination": {...}}}`. Every field is
/// optional; list responses without pagination decode to the default.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetaResponse {
    #[serde(default)]
    pub meta: MetaSchema,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetaSchema {
    #[serde(default)]
    pub pagination: Option<PaginationSchema>,
}

/// Pagination block. Page links are null on the first and last page, so
/// every field tolerates null as well as absence.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaginationSchema {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub previous_page: Option<u32>,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub last_page: Option<u32>,
    #[serde(default)]
    pub total_entries: Option<u64>,
}

impl From<PaginationSchema> for Pagination {
    fn from(s: PaginationSchema) -> Self {
        Pagination {
            page: s.page.unwrap_or(0),
            per_page: s.per_page.unwrap_or(0),
            previous_page: s.previous_page.unwrap_or(0),
            next_page: s.next_page.unwrap_or(0),
            last_page: s.last_page.unwrap_or(0),
            total_entries: s.total_entries.unwrap_or(0),
        }
    }
}

impl From<ErrorSchema> for ApiError {
    fn from(s: ErrorSchema) -> Self {
        let code = ErrorCode::from(s.code);
        let details = match (&code, s.details) {
            (ErrorCode::InvalidInput, Some(value)) => {
                serde_json::from_value::<InvalidInputDetails>(value)
                    .ok()
                    .map(|d| ErrorDetails::InvalidInput {
                        fields: d
                            .fields
                            .into_iter()
                            .map(|f| InvalidInputField {
                                name: f.name,
                                messages: f.messages,
                            })
                            .collect(),
                    })
            }
            _ => None,
        };
        ApiError {
            code,
            message: s.message,
            details,
        }
    }
}

/// Classifies an error-range response body into a structured [`ApiError`].
///
/// Yields `None` when the body is not claimed to be JSON, does not decode
/// as an error envelope, or decodes with both code and message empty. A
/// non-JSON body despite a JSON content-type is an expected outcome here
/// (proxy-injected error pages), so the decode error is swallowed.
pub(crate) fn classify_error(headers: &HeaderMap, body: &[u8]) -> Option<ApiError> {
    if !is_json(headers) {
        return None;
    }
    let parsed: ErrorResponse = serde_json::from_slice(body).ok()?;
    if parsed.error.code.is_empty() && parsed.error.message.is_empty() {
        return None;
    }
    Some(ApiError::from(parsed.error))
}
