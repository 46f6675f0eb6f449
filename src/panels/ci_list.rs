//! CI inventory list (`GET /cis`) and its pagination controls.
//!
//! The server's `total` is the only authority on how many pages exist. The
//! window shown to the operator is recomputed from the latest response and
//! the offset that response was fetched at, never from an assumed page count.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ProjectionContext, decode_value};
use crate::api::{ApiRequest, endpoints};
use crate::state::query::{PageWindow, QueryState};

/// One page of CIs as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CiPage {
    pub items: Vec<CiRecord>,
    pub total: u64,
    /// Offset the page was requested at. Filled in by [`decode`].
    #[serde(skip)]
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CiRecord {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub name: String,
    pub ci_type: String,
    pub source: String,
    pub status: String,
    pub owner: Option<String>,
    pub environment: Option<String>,
    pub attributes: Map<String, Value>,
    pub last_seen_at: Option<String>,
    pub updated_at: Option<String>,
}

impl CiRecord {
    /// Top-level `environment` when present, else the attribute of that name.
    pub fn environment(&self) -> Option<&str> {
        self.environment
            .as_deref()
            .or_else(|| self.attributes.get("environment").and_then(Value::as_str))
            .filter(|e| !e.is_empty())
    }
}

impl CiPage {
    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: self.offset,
            count: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
            total: self.total,
        }
    }

    pub fn first_id(&self) -> Option<&str> {
        self.items.first().map(|ci| ci.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiRow {
    pub id: String,
    pub name: String,
    pub ci_type: String,
    pub source: String,
    pub status: String,
    pub owner: String,
    pub environment: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiListView {
    pub rows: Vec<CiRow>,
    pub range_label: String,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// Active filters as `key=value` pairs, for the panel header.
    pub filters: Vec<String>,
}

pub fn request(query: &QueryState) -> ApiRequest {
    endpoints::list_cis(query)
}

pub fn decode(value: Value, offset: u32) -> serde_json::Result<CiPage> {
    let mut page: CiPage = decode_value(value)?;
    page.offset = offset;
    Ok(page)
}

pub fn project(page: &CiPage, ctx: &ProjectionContext<'_>) -> CiListView {
    let window = page.window();
    CiListView {
        rows: page
            .items
            .iter()
            .map(|ci| CiRow {
                id: ci.id.clone(),
                name: ci.name.clone(),
                ci_type: ci.ci_type.clone(),
                source: ci.source.clone(),
                status: ci.status.clone(),
                owner: ci.owner.clone().unwrap_or_default(),
                environment: ci.environment().unwrap_or_default().to_string(),
                selected: ctx.selected == Some(ci.id.as_str()),
            })
            .collect(),
        range_label: window.label(),
        prev_enabled: window.has_prev(),
        next_enabled: window.has_next(),
        filters: active_filters(ctx.query),
    }
}

fn active_filters(query: &QueryState) -> Vec<String> {
    [
        ("q", &query.text),
        ("source", &query.source),
        ("status", &query.status),
        ("owner", &query.owner),
        ("environment", &query.environment),
        ("class", &query.ci_class),
    ]
    .into_iter()
    .filter(|(_, v)| !v.is_empty())
    .map(|(k, v)| format!("{k}={v}"))
    .collect()
}
