//! Upstream/downstream neighbours of the selected CI (`GET /cis/{id}/graph`).

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_value};
use super::ci_list::CiRecord;
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CiGraph {
    pub ci: Option<CiRecord>,
    pub upstream: Vec<Edge>,
    pub downstream: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Edge {
    pub source_ci_id: String,
    pub target_ci_id: String,
    pub relation_type: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphView {
    /// `neighbour --type--> selected`
    pub upstream: Vec<String>,
    /// `selected --type--> neighbour`
    pub downstream: Vec<String>,
}

pub fn request(ci_id: &str) -> ApiRequest {
    endpoints::ci_graph(ci_id)
}

pub fn decode(value: Value) -> serde_json::Result<CiGraph> {
    decode_value(value)
}

pub fn project(graph: &CiGraph, ctx: &ProjectionContext<'_>) -> GraphView {
    let line = |e: &Edge| {
        format!(
            "{} --{}--> {}",
            ctx.names.label(&e.source_ci_id),
            e.relation_type,
            ctx.names.label(&e.target_ci_id)
        )
    };
    GraphView {
        upstream: graph.upstream.iter().map(line).collect(),
        downstream: graph.downstream.iter().map(line).collect(),
    }
}
