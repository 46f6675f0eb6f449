/// HTTP transport behind the gateway client.
///
/// The gateway only needs "send this request, give me status + body back".
/// Keeping that behind a trait lets the dispatcher fan requests out across
/// threads and lets tests record calls without a live CMDB.
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::error::ApiError;

/// HTTP verbs used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved outbound request, credential included.
#[derive(Debug)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    pub token: &'a str,
    pub body: Option<&'a Value>,
}

/// Status line and raw body of a completed exchange, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Implementations must not retry and must report
/// non-success statuses as `Ok(RawResponse)`; only connection-level
/// failures become [`ApiError::Network`].
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest<'_>) -> Result<RawResponse, ApiError>;
}

/// Shared handles forward to the transport they point at.
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest<'_>) -> Result<RawResponse, ApiError> {
        (**self).send(request)
    }
}

// ---------------------------------------------------------------------------
// ureq
// ---------------------------------------------------------------------------

/// Blocking transport over a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build a transport. A zero timeout leaves the remote's own latency
    /// in charge; no local deadline is enforced.
    pub fn new(timeout_ms: u64) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest<'_>) -> Result<RawResponse, ApiError> {
        // On Windows, "localhost" may try IPv6 (::1) first, causing delays
        // when the API only binds to IPv4.
        let url = request.url.replace("://localhost", "://127.0.0.1");

        let req = self
            .agent
            .request(request.method.as_str(), &url)
            .set("Authorization", &format!("Bearer {}", request.token))
            .set("Accept", "application/json");

        let result = match request.body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };

        match result {
            Ok(resp) => Ok(into_raw(resp)),
            Err(ureq::Error::Status(_, resp)) => Ok(into_raw(resp)),
            Err(ureq::Error::Transport(err)) => Err(ApiError::Network {
                message: err.to_string(),
            }),
        }
    }
}

fn into_raw(resp: ureq::Response) -> RawResponse {
    let status = resp.status();
    let status_text = resp.status_text().to_string();
    let body = resp.into_string().unwrap_or_default();
    RawResponse {
        status,
        status_text,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        let mut raw = RawResponse {
            status: 204,
            status_text: "No Content".to_string(),
            body: String::new(),
        };
        assert!(raw.is_success());
        raw.status = 302;
        assert!(!raw.is_success());
        raw.status = 500;
        assert!(!raw.is_success());
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) on loopback is closed in any sane test environment.
        let transport = UreqTransport::new(2_000);
        let result = transport.send(&HttpRequest {
            method: Method::Get,
            url: "http://127.0.0.1:9/dashboard/me",
            token: "t",
            body: None,
        });
        assert!(matches!(result, Err(ApiError::Network { .. })));
    }
}
