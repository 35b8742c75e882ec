//! Response envelope and response metadata
//!
//! [`ApiResponse`] wraps a raw HTTP response whose body has been buffered
//! into memory, together with the pagination and rate-limit metadata
//! extracted from it.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::schema::MetaResponse;

/// A response from the API.
///
/// The body is fully buffered so that it can be inspected for metadata and
/// decoded (or handed out raw) afterwards. Constructed by the client once
/// per attempt; owned by the caller after return.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    /// Metadata extracted from the response headers and body.
    pub meta: Meta,
}

impl ApiResponse {
    /// Wraps a buffered response, extracting its metadata.
    ///
    /// Rate-limit headers are parsed whenever present; the pagination block
    /// only when the response claims a JSON content-type. A body that
    /// claims JSON but fails to parse is a metadata error.
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Result<Self> {
        let mut meta = Meta {
            pagination: None,
            rate_limit: RateLimit::from_headers(&headers),
        };
        if is_json(&headers) {
            let parsed: MetaResponse =
                serde_json::from_slice(&body).map_err(|source| Error::Meta { source })?;
            meta.pagination = parsed.meta.pagination.map(Pagination::from);
        }
        Ok(ApiResponse {
            status,
            headers,
            body,
            meta,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw, buffered response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the buffered body into `T`.
    ///
    /// Borrows the envelope, so a decode failure leaves it intact for raw
    /// inspection.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| Error::Decode { source })
    }
}

/// Metadata included in an API response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    /// Pagination metadata; present only when the backend reports it.
    pub pagination: Option<Pagination>,
    /// Rate-limit counters from the response headers.
    pub rate_limit: RateLimit,
}

/// Pagination metadata. Page numbers start at 1; 0 means "no such page".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub previous_page: u32,
    pub next_page: u32,
    pub last_page: u32,
    pub total_entries: u64,
}

/// Rate-limit counters, populated opportunistically from the
/// `RateLimit-Limit`, `RateLimit-Remaining` and `RateLimit-Reset` headers.
/// Absent or malformed headers leave the corresponding field at its
/// default, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimit {
    fn from_headers(headers: &HeaderMap) -> Self {
        RateLimit {
            limit: parse_header(headers, "RateLimit-Limit").unwrap_or(0),
            remaining: parse_header(headers, "RateLimit-Remaining").unwrap_or(0),
            reset: parse_header::<i64>(headers, "RateLimit-Reset")
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

fn parse_header<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Whether the response declares a JSON body.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn rate_limit_headers_are_parsed() {
        let headers = headers(&[
            ("RateLimit-Limit", "3600"),
            ("RateLimit-Remaining", "2996"),
            ("RateLimit-Reset", "1700000000"),
        ]);
        let response = ApiResponse::new(StatusCode::OK, headers, Vec::new()).unwrap();
        assert_eq!(response.meta.rate_limit.limit, 3600);
        assert_eq!(response.meta.rate_limit.remaining, 2996);
        assert_eq!(
            response.meta.rate_limit.reset,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn malformed_rate_limit_headers_stay_at_default() {
        let headers = headers(&[("RateLimit-Limit", "a lot"), ("RateLimit-Reset", "soon")]);
        let response = ApiResponse::new(StatusCode::OK, headers, Vec::new()).unwrap();
        assert_eq!(response.meta.rate_limit, RateLimit::default());
    }

    #[test]
    fn pagination_is_parsed_from_json_body() {
        let body = br#"{
            "servers": [],
            "meta": {
                "pagination": {
                    "page": 2, "per_page": 25, "previous_page": 1,
                    "next_page": 3, "last_page": 4, "total_entries": 100
                }
            }
        }"#;
        let response = ApiResponse::new(
            StatusCode::OK,
            headers(&[("Content-Type", "application/json")]),
            body.to_vec(),
        )
        .unwrap();
        let pagination = response.meta.pagination.expect("pagination");
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.next_page, 3);
        assert_eq!(pagination.total_entries, 100);
    }

    #[test]
    fn body_without_meta_block_has_no_pagination() {
        let response = ApiResponse::new(
            StatusCode::OK,
            headers(&[("Content-Type", "application/json")]),
            br#"{"server": {"id": 42}}"#.to_vec(),
        )
        .unwrap();
        assert!(response.meta.pagination.is_none());
    }

    #[test]
    fn non_json_body_skips_pagination_parse() {
        let response = ApiResponse::new(
            StatusCode::OK,
            headers(&[("Content-Type", "text/plain")]),
            b"not json at all".to_vec(),
        )
        .unwrap();
        assert!(response.meta.pagination.is_none());
    }

    #[test]
    fn invalid_json_with_json_content_type_is_a_meta_error() {
        let result = ApiResponse::new(
            StatusCode::OK,
            headers(&[("Content-Type", "application/json")]),
            b"<html>gateway error</html>".to_vec(),
        );
        assert!(matches!(result, Err(Error::Meta { .. })));
    }

    #[test]
    fn decode_borrows_the_envelope() {
        let response = ApiResponse::new(
            StatusCode::OK,
            headers(&[("Content-Type", "application/json")]),
            br#"{"value": 7}"#.to_vec(),
        )
        .unwrap();
        let decoded: serde_json::Value = response.decode().unwrap();
        assert_eq!(decoded["value"], 7);
        // Envelope still usable after a failed decode into the wrong type.
        assert!(response.decode::<Vec<u32>>().is_err());
        assert!(!response.body().is_empty());
    }
}
