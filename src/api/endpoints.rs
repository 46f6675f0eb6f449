//! Request builders for every endpoint the dashboard talks to.
//!
//! Paths and parameter names follow the CMDB service contract. Builders are
//! pure: they never look at dashboard state beyond what they are handed.

use serde_json::json;

use super::ApiRequest;
use crate::state::query::QueryState;

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// `GET /dashboard/me`: identity probe, `{principal, scope}`.
pub fn identity() -> ApiRequest {
    ApiRequest::get(&["dashboard", "me"])
}

/// `GET /dashboard/summary`: totals, sync state, distributions.
pub fn summary() -> ApiRequest {
    ApiRequest::get(&["dashboard", "summary"])
}

/// `GET /dashboard/alerts`: alert rule snapshot.
pub fn alerts() -> ApiRequest {
    ApiRequest::get(&["dashboard", "alerts"])
}

/// `GET /dashboard/activity?limit=N`.
pub fn activity(limit: u32) -> ApiRequest {
    ApiRequest::get(&["dashboard", "activity"]).query("limit", limit)
}

// ---------------------------------------------------------------------------
// CIs
// ---------------------------------------------------------------------------

/// `GET /cis?{filters,limit,offset}`: blank filters are omitted.
pub fn list_cis(query: &QueryState) -> ApiRequest {
    ApiRequest::get(&["cis"])
        .query_non_empty("q", &query.text)
        .query_non_empty("source", &query.source)
        .query_non_empty("status", &query.status)
        .query_non_empty("owner", &query.owner)
        .query_non_empty("environment", &query.environment)
        .query_non_empty("ciClass", &query.ci_class)
        .query("limit", query.limit())
        .query("offset", query.offset())
}

pub fn ci_detail(ci_id: &str) -> ApiRequest {
    ApiRequest::get(&["cis", ci_id, "detail"])
}

pub fn ci_drift(ci_id: &str) -> ApiRequest {
    ApiRequest::get(&["cis", ci_id, "drift"])
}

/// `POST /cis/{id}/drift/resolve` with `{source, fields[]}`.
pub fn resolve_drift(ci_id: &str, source: &str, fields: &[String]) -> ApiRequest {
    ApiRequest::post(&["cis", ci_id, "drift", "resolve"])
        .json(json!({ "source": source, "fields": fields }))
}

pub fn ci_graph(ci_id: &str) -> ApiRequest {
    ApiRequest::get(&["cis", ci_id, "graph"])
}

/// `GET /pickers/cis?q=&limit=`: lightweight id/name records.
pub fn picker(search: &str, limit: u32) -> ApiRequest {
    ApiRequest::get(&["pickers", "cis"])
        .query_non_empty("q", search)
        .query("limit", limit)
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// `GET /relationships?ci_id=&limit=`.
pub fn relationships_for(ci_id: &str, limit: u32) -> ApiRequest {
    ApiRequest::get(&["relationships"])
        .query("ci_id", ci_id)
        .query("limit", limit)
}

pub fn create_relationship(
    source_ci_id: &str,
    target_ci_id: &str,
    relation_type: &str,
    source: &str,
) -> ApiRequest {
    ApiRequest::post(&["relationships"]).json(json!({
        "source_ci_id": source_ci_id,
        "target_ci_id": target_ci_id,
        "relation_type": relation_type,
        "source": source,
    }))
}

pub fn delete_relationship(relationship_id: &str) -> ApiRequest {
    ApiRequest::delete(&["relationships", relationship_id])
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// `GET /governance/collisions?status=`: blank status lists everything.
pub fn collisions(status: &str) -> ApiRequest {
    ApiRequest::get(&["governance", "collisions"]).query_non_empty("status", status)
}

pub fn resolve_collision(collision_id: &str, note: &str) -> ApiRequest {
    ApiRequest::post(&["governance", "collisions", collision_id, "resolve"])
        .json(json!({ "resolution_note": note }))
}

pub fn reopen_collision(collision_id: &str, note: &str) -> ApiRequest {
    ApiRequest::post(&["governance", "collisions", collision_id, "reopen"])
        .json(json!({ "resolution_note": note }))
}

// ---------------------------------------------------------------------------
// Integrations, lifecycle, exports
// ---------------------------------------------------------------------------

/// `GET /integrations/jobs?limit=`.
pub fn jobs(limit: u32) -> ApiRequest {
    ApiRequest::get(&["integrations", "jobs"]).query("limit", limit)
}

/// Query flags shared by the sync triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncFlags {
    pub async_job: bool,
    pub incremental: bool,
    pub dry_run: bool,
    pub limit: Option<u32>,
}

fn with_sync_flags(request: ApiRequest, flags: &SyncFlags) -> ApiRequest {
    let request = request
        .flag("asyncJob", flags.async_job)
        .flag("incremental", flags.incremental)
        .flag("dryRun", flags.dry_run);
    match flags.limit {
        Some(limit) => request.query("limit", limit),
        None => request,
    }
}

pub fn netbox_import(flags: &SyncFlags) -> ApiRequest {
    with_sync_flags(ApiRequest::post(&["integrations", "netbox", "import"]), flags)
}

pub fn backstage_sync(flags: &SyncFlags) -> ApiRequest {
    with_sync_flags(ApiRequest::post(&["integrations", "backstage", "sync"]), flags)
}

pub fn trigger_schedule(name: &str) -> ApiRequest {
    ApiRequest::post(&["integrations", "schedules", name, "trigger"])
}

pub fn lifecycle_run() -> ApiRequest {
    ApiRequest::post(&["lifecycle", "run"])
}

/// `GET /audit/export?limit=`: newline-delimited JSON records.
pub fn audit_export(limit: u32) -> ApiRequest {
    ApiRequest::get(&["audit", "export"]).query("limit", limit)
}

/// `GET /integrations/netbox/export?limit=`: one JSON document.
pub fn netbox_export(limit: u32) -> ApiRequest {
    ApiRequest::get(&["integrations", "netbox", "export"]).query("limit", limit)
}
