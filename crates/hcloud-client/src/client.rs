//! API client: configuration, request construction, and the execution
//! engine with rate-limit aware retries.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;

use crate::backoff::{self, BackoffFn};
use crate::error::{Error, ErrorCode, Result};
use crate::response::ApiResponse;
use crate::schema::classify_error;

/// Default base URL of the API.
pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

/// Value for the library part of the `User-Agent` header sent with each
/// request.
pub const USER_AGENT: &str = concat!("hcloud-client/", env!("CARGO_PKG_VERSION"));

/// A client for the Hetzner Cloud API.
///
/// Configuration is immutable after construction; see [`ClientBuilder`].
/// The client is safe for concurrent use: calls share no mutable state
/// beyond the transport's connection pool, and each call owns its own
/// retry counter. Dropping a call's future cancels an in-flight send and
/// any pending backoff sleep.
pub struct Client {
    endpoint: String,
    token: String,
    poll_interval: Duration,
    backoff: BackoffFn,
    max_retries: Option<u32>,
    http: reqwest::Client,
    user_agent: String,
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    endpoint: String,
    token: String,
    poll_interval: Duration,
    backoff: BackoffFn,
    max_retries: Option<u32>,
    http: Option<reqwest::Client>,
    application_name: String,
    application_version: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            poll_interval: Duration::from_millis(500),
            backoff: backoff::exponential(2.0, Duration::from_millis(500)),
            max_retries: None,
            http: None,
            application_name: String::new(),
            application_version: String::new(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API endpoint. Trailing slashes are trimmed.
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Sets the token used for authentication.
    pub fn token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    /// Sets the interval callers should use when polling asynchronous
    /// actions. The engine itself does not use it.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the backoff function applied between rate-limit retries.
    pub fn backoff_fn(mut self, backoff: BackoffFn) -> Self {
        self.backoff = backoff;
        self
    }

    /// Caps the number of rate-limit retries per request. `None` (the
    /// default) retries until cancelled.
    pub fn max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the application name and version reported in the `User-Agent`
    /// header. The version may be blank; programs are encouraged to at
    /// least set a name.
    pub fn application(mut self, name: &str, version: &str) -> Self {
        self.application_name = name.to_string();
        self.application_version = version.to_string();
        self
    }

    /// Supplies a pre-configured transport instead of the default one.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Client {
        let user_agent = match (
            self.application_name.is_empty(),
            self.application_version.is_empty(),
        ) {
            (false, false) => format!(
                "{}/{} {USER_AGENT}",
                self.application_name, self.application_version
            ),
            (false, true) => format!("{} {USER_AGENT}", self.application_name),
            _ => USER_AGENT.to_string(),
        };
        Client {
            endpoint: self.endpoint,
            token: self.token,
            poll_interval: self.poll_interval,
            backoff: self.backoff,
            max_retries: self.max_retries,
            http: self.http.unwrap_or_default(),
            user_agent,
        }
    }
}

impl Client {
    /// Creates a client with default configuration and the given token.
    pub fn new(token: &str) -> Self {
        ClientBuilder::new().token(token).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The interval callers should use when polling asynchronous actions.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Creates an HTTP request against the API.
    ///
    /// `path` is appended to the configured endpoint; the resulting URL is
    /// only validated by the URL parser. All necessary headers (user
    /// agent, auth, content type for bodies) are set. No I/O happens here.
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Request> {
        let raw_url = format!("{}{}", self.endpoint, path);
        let url = Url::parse(&raw_url).map_err(|e| Error::Build {
            message: format!("invalid url {raw_url}: {e}"),
        })?;
        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT_HEADER, &self.user_agent)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body);
        }
        builder.build().map_err(|e| Error::Build {
            message: e.to_string(),
        })
    }

    /// Sends a request to completion and returns the envelope with its
    /// raw, buffered body.
    pub async fn fetch_raw(&self, request: Request) -> Result<ApiResponse> {
        self.execute(request).await
    }

    /// Sends a request to completion and decodes the successful body
    /// into `T`.
    ///
    /// The envelope is returned alongside the decoded value so callers can
    /// inspect pagination and rate-limit metadata. Callers that need the
    /// envelope even when decoding fails should use [`Client::fetch_raw`]
    /// and [`ApiResponse::decode`], which borrows.
    pub async fn fetch_decoded<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<(ApiResponse, T)> {
        let response = self.execute(request).await?;
        let value = response.decode()?;
        Ok((response, value))
    }

    /// The execution engine: send, classify, and retry on rate-limit
    /// rejection.
    ///
    /// Transport errors and metadata decode errors are final. Error-range
    /// statuses are classified into a structured error; only the
    /// `rate_limit_exceeded` code is retried, after sleeping for the
    /// configured backoff, resending the original request as-is. Every
    /// other classified error, and a generic status error when
    /// classification yields nothing, is returned to the caller.
    async fn execute(&self, request: Request) -> Result<ApiResponse> {
        let mut retries: u32 = 0;
        loop {
            let attempt = request.try_clone().ok_or_else(|| Error::Build {
                message: "request body cannot be cloned for resending".to_string(),
            })?;
            log::debug!("{} {}", attempt.method(), attempt.url());

            let raw = self.http.execute(attempt).await?;
            let status = raw.status();
            let headers = raw.headers().clone();
            let body = raw.bytes().await?.to_vec();

            let response = ApiResponse::new(status, headers, body)?;

            if status.is_client_error() || status.is_server_error() {
                return match classify_error(response.headers(), response.body()) {
                    Some(err) if err.code == ErrorCode::RateLimitExceeded => {
                        if self.max_retries.is_some_and(|max| retries >= max) {
                            return Err(Error::Api(err));
                        }
                        let delay = (self.backoff)(retries);
                        retries += 1;
                        log::warn!(
                            "rate limit exceeded, waiting {delay:?} before retry {retries}"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    Some(err) => Err(Error::Api(err)),
                    None => Err(Error::Status {
                        status: status.as_u16(),
                    }),
                };
            }

            return Ok(response);
        }
    }

    /// Drains a paginated collection.
    ///
    /// Invokes `fetch_page` starting at page 1, advancing to whatever page
    /// the response advertises as next, and stops when the response
    /// carries no pagination metadata or a next page of 0. The driver
    /// never computes page numbers itself. Any error aborts immediately;
    /// per-page retry already happened inside the engine. Returns the last
    /// envelope.
    pub async fn all_pages<F, Fut>(&self, mut fetch_page: F) -> Result<ApiResponse>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<ApiResponse>>,
    {
        let mut page = 1;
        loop {
            let response = fetch_page(page).await?;
            match &response.meta.pagination {
                Some(p) if p.next_page != 0 => page = p.next_page,
                _ => return Ok(response),
            }
        }
    }
}

/// Options for listing resources.
///
/// Zero and empty fields are defaults and are omitted from the query
/// string, never serialized as `0` or an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOpts {
    /// Page to fetch, starting at 1. 0 leaves the choice to the backend.
    pub page: u32,
    /// Items per page. 0 uses the backend default.
    pub per_page: u32,
    /// Label selector for filtering by labels.
    pub label_selector: String,
}

impl ListOpts {
    /// Serializes the non-default options as URL query pairs, without a
    /// leading `?`.
    pub fn to_query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if self.page > 0 {
            query.append_pair("page", &self.page.to_string());
        }
        if self.per_page > 0 {
            query.append_pair("per_page", &self.per_page.to_string());
        }
        if !self.label_selector.is_empty() {
            query.append_pair("label_selector", &self.label_selector);
        }
        query.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_with_application_name_and_version() {
        let client = Client::builder().application("foo", "1.0").build();
        assert_eq!(client.user_agent, format!("foo/1.0 {USER_AGENT}"));
    }

    #[test]
    fn user_agent_with_application_name_only() {
        let client = Client::builder().application("foo", "").build();
        assert_eq!(client.user_agent, format!("foo {USER_AGENT}"));
    }

    #[test]
    fn user_agent_without_application() {
        let client = Client::builder().build();
        assert_eq!(client.user_agent, USER_AGENT);
    }

    #[test]
    fn endpoint_trailing_slashes_are_trimmed() {
        let client = Client::builder().endpoint("https://example.com/v1///").build();
        assert_eq!(client.endpoint, "https://example.com/v1");
    }

    #[test]
    fn build_request_sets_headers() {
        let client = Client::builder().token("secret").build();
        let request = client
            .build_request(Method::GET, "/servers", None)
            .unwrap();
        assert_eq!(request.url().as_str(), format!("{DEFAULT_ENDPOINT}/servers"));
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
        assert_eq!(
            request.headers().get(USER_AGENT_HEADER).unwrap(),
            USER_AGENT
        );
        assert!(request.headers().get(CONTENT_TYPE).is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn build_request_sets_content_type_only_with_body() {
        let client = Client::builder().build();
        let request = client
            .build_request(Method::POST, "/servers", Some(br#"{"name":"a"}"#.to_vec()))
            .unwrap();
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(request.body().is_some());
    }

    #[test]
    fn build_request_empty_token_still_sends_header() {
        let client = Client::builder().build();
        let request = client.build_request(Method::GET, "/servers", None).unwrap();
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer ");
    }

    #[test]
    fn build_request_rejects_malformed_url() {
        let client = Client::builder().endpoint("not a url").build();
        let result = client.build_request(Method::GET, "/servers", None);
        assert!(matches!(result, Err(Error::Build { .. })));
    }

    #[test]
    fn list_opts_defaults_produce_empty_query() {
        assert_eq!(ListOpts::default().to_query(), "");
    }

    #[test]
    fn list_opts_page_alone() {
        let opts = ListOpts {
            page: 2,
            ..Default::default()
        };
        assert_eq!(opts.to_query(), "page=2");
    }

    #[test]
    fn list_opts_full() {
        let opts = ListOpts {
            page: 2,
            per_page: 50,
            label_selector: "env=prod".to_string(),
        };
        assert_eq!(opts.to_query(), "page=2&per_page=50&label_selector=env%3Dprod");
    }
}
