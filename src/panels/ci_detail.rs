//! Selected CI detail (`GET /cis/{id}/detail`).

use serde::Deserialize;
use serde_json::Value;

use super::ci_list::CiRecord;
use super::graph::Edge;
use super::{ProjectionContext, cell, decode_value};
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CiDetail {
    pub ci: CiRecord,
    pub identities: Vec<IdentityKey>,
    pub upstream: Vec<Edge>,
    pub downstream: Vec<Edge>,
    pub recent_audit: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdentityKey {
    pub scheme: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub title: String,
    pub fields: Vec<(String, String)>,
    pub attributes: Vec<(String, String)>,
    pub identities: Vec<String>,
    pub neighbours: String,
}

pub fn request(ci_id: &str) -> ApiRequest {
    endpoints::ci_detail(ci_id)
}

pub fn decode(value: Value) -> serde_json::Result<CiDetail> {
    decode_value(value)
}

pub fn project(detail: &CiDetail, _ctx: &ProjectionContext<'_>) -> DetailView {
    let ci = &detail.ci;
    let fields = [
        ("id", ci.id.clone()),
        ("type", ci.ci_type.clone()),
        ("status", ci.status.clone()),
        ("source", ci.source.clone()),
        ("owner", ci.owner.clone().unwrap_or_default()),
        ("environment", ci.environment().unwrap_or_default().to_string()),
        ("last seen", ci.last_seen_at.clone().unwrap_or_default()),
    ]
    .into_iter()
    .filter(|(_, v)| !v.is_empty())
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    // serde_json's Map is ordered by key unless preserve_order is enabled.
    let attributes = ci
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), cell(v)))
        .collect();

    DetailView {
        title: if ci.name.is_empty() {
            ci.id.clone()
        } else {
            ci.name.clone()
        },
        fields,
        attributes,
        identities: detail
            .identities
            .iter()
            .map(|i| format!("{}:{}", i.scheme, i.value))
            .collect(),
        neighbours: format!(
            "{} upstream, {} downstream, {} recent audit event(s)",
            detail.upstream.len(),
            detail.downstream.len(),
            detail.recent_audit.len()
        ),
    }
}
