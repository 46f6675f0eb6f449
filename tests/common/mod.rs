//! Shared fixtures: a recording transport with canned routes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cmdbdash::api::{ApiClient, ApiError, HttpRequest, Method, RawResponse, Transport};
use cmdbdash::config::schema::DashboardConfig;
use cmdbdash::dispatch::Dashboard;
use cmdbdash::journal::Journal;
use cmdbdash::session::MemorySessionStore;
use cmdbdash::state::DashboardState;
use serde_json::{Value, json};

pub const BASE: &str = "http://cmdb.test";

struct Route {
    method: Method,
    path: String,
    status: u16,
    body: String,
}

/// Answers by method and path (query string ignored) and records every call
/// as `METHOD /path?query`.
pub struct MockCmdb {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl MockCmdb {
    /// Operator identity, one CI (`ci-1`/`alpha`), empty lists elsewhere.
    pub fn new() -> Arc<Self> {
        let mock = Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        });
        mock.scope("operator");
        mock.cis(json!([{"id": "ci-1", "name": "alpha"}]), 1);
        mock
    }

    pub fn route(&self, method: Method, path: &str, status: u16, body: Value) {
        let body = match body {
            Value::String(text) => text,
            other => other.to_string(),
        };
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|r| !(r.method == method && r.path == path));
        routes.push(Route {
            method,
            path: path.to_string(),
            status,
            body,
        });
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) {
        self.route(method, path, 200, body);
    }

    pub fn scope(&self, scope: &str) {
        self.ok(
            Method::Get,
            "/dashboard/me",
            json!({"principal": format!("{scope}-user"), "scope": scope}),
        );
    }

    pub fn cis(&self, items: Value, total: u64) {
        self.ok(Method::Get, "/cis", json!({"items": items, "total": total}));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl Transport for MockCmdb {
    fn send(&self, request: &HttpRequest<'_>) -> Result<RawResponse, ApiError> {
        let target = request.url.strip_prefix(BASE).unwrap_or(request.url);
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {target}", request.method));

        let path = target.split('?').next().unwrap_or(target);
        let routes = self.routes.lock().unwrap();
        let (status, body) = routes
            .iter()
            .find(|r| r.method == request.method && r.path == path)
            .map(|r| (r.status, r.body.clone()))
            .unwrap_or_else(|| match request.method {
                Method::Get => (200, json!({"items": []}).to_string()),
                _ => (200, json!({"ok": true}).to_string()),
            });
        Ok(RawResponse {
            status,
            status_text: if status < 300 { "OK" } else { "Error" }.to_string(),
            body,
        })
    }
}

pub fn dashboard(mock: &Arc<MockCmdb>) -> Dashboard {
    dashboard_with(mock, Some("token"), Journal::disabled())
}

pub fn dashboard_with(mock: &Arc<MockCmdb>, token: Option<&str>, journal: Journal) -> Dashboard {
    let client = ApiClient::new(
        BASE,
        Arc::new(MemorySessionStore::new(token)),
        Box::new(Arc::clone(mock)),
    )
    .unwrap();
    Dashboard::new(
        client,
        DashboardConfig::default(),
        journal,
        DashboardState::default(),
    )
}
