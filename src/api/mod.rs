//! API gateway client: the single chokepoint for authenticated calls.
//!
//! Every call reads the credential from the session store first and fails
//! with [`ApiError::Auth`] before any network I/O when none is present.
//! Non-success statuses become [`ApiError::Transport`] with the status line
//! and body captured verbatim. The client never retries and never touches
//! dashboard state; callers own what happens on success.

pub mod endpoints;
pub mod error;
pub mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

use crate::session::SessionStore;

pub use error::ApiError;
pub use transport::{HttpRequest, Method, RawResponse, Transport, UreqTransport};

/// Base used to render request targets without a configured server.
const DISPLAY_BASE: &str = "http://cmdb.local/";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Method, path segments, query pairs and optional JSON body of one call.
///
/// Segments are percent-encoded when the request is resolved against the
/// base URL, so entity ids never need escaping by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::Post, segments)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::Delete, segments)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only when the value is non-blank.
    pub fn query_non_empty(self, key: &str, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            self
        } else {
            self.query(key, value)
        }
    }

    /// Append a boolean flag only when it is set.
    pub fn flag(self, key: &str, on: bool) -> Self {
        if on { self.query(key, "true") } else { self }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolve against a base URL. The base may carry a path prefix.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&self.segments);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }

    /// Path and query string, e.g. `/cis?status=RETIRED&limit=20&offset=0`.
    pub fn target(&self) -> String {
        let Ok(base) = Url::parse(DISPLAY_BASE) else {
            return format!("/{}", self.segments.join("/"));
        };
        let url = self.url(&base);
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }
}

impl std::fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.target())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated gateway to the CMDB REST API.
///
/// `Send + Sync`: the dispatcher shares one client across the threads of a
/// concurrent load stage.
pub struct ApiClient {
    base_url: Url,
    session: Arc<dyn SessionStore>,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        session: Arc<dyn SessionStore>,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid API base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry paths: {base_url}");
        }
        Ok(Self {
            base_url,
            session,
            transport,
        })
    }

    /// Issue a call and parse the response body.
    ///
    /// Empty bodies parse to `Value::Null`; bodies that are not JSON are
    /// returned as `Value::String` so text endpoints still round-trip.
    pub fn call(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let body = self.fetch(request)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Issue a call and return the raw body text (exports).
    pub fn download(&self, request: &ApiRequest) -> Result<String, ApiError> {
        self.fetch(request)
    }

    fn fetch(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let token = self
            .session
            .token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::Auth)?;

        let url = request.url(&self.base_url);
        tracing::debug!(method = %request.method, url = %url, "api call");

        let raw = self.transport.send(&HttpRequest {
            method: request.method,
            url: url.as_str(),
            token: token.trim(),
            body: request.body.as_ref(),
        })?;

        if !raw.is_success() {
            return Err(ApiError::Transport {
                status: raw.status,
                status_text: raw.status_text,
                body: raw.body,
            });
        }
        Ok(raw.body)
    }
}
