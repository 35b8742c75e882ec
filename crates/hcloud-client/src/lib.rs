//! hcloud-client - Async client for the Hetzner Cloud API
//!
//! This crate provides the request execution pipeline for talking to the
//! Hetzner Cloud REST API: authenticated request construction, JSON
//! response and error decoding, pagination and rate-limit metadata
//! tracking, and transparent retries with configurable backoff when the
//! API rejects a request for rate-limit reasons.
//!
//! # Main Components
//!
//! - **Client & builder**: immutable configuration (endpoint, token,
//!   backoff policy, application identity) behind an options pattern
//! - **Execution engine**: [`Client::fetch_raw`] / [`Client::fetch_decoded`]
//!   send a request to completion, retrying only on `rate_limit_exceeded`
//! - **Response envelope**: [`ApiResponse`] with pagination and rate-limit
//!   metadata parsed from headers and body
//! - **Error handling**: structured [`ApiError`] values with stable codes
//!   and typed details, using `thiserror`
//!
//! # Example
//!
//! ```no_run
//! use hcloud_client::{Client, Result};
//!
//! async fn example() -> Result<()> {
//!     let client = Client::new("my-api-token");
//!     let servers = client.all_servers().await?;
//!     println!("{} servers", servers.len());
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod client;
pub mod error;
pub mod response;
pub mod server;

mod schema;

// Re-export main types for convenience
pub use backoff::BackoffFn;
pub use client::{Client, ClientBuilder, ListOpts, DEFAULT_ENDPOINT, USER_AGENT};
pub use error::{ApiError, Error, ErrorCode, ErrorDetails, InvalidInputField, Result};
pub use response::{ApiResponse, Meta, Pagination, RateLimit};
pub use server::Server;

// Re-export commonly used transport types
pub use reqwest::{Method, StatusCode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
