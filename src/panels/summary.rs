//! Aggregate KPI panel (`GET /dashboard/summary`).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_value};
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub totals: BTreeMap<String, u64>,
    pub distributions: Distributions,
    pub sync: SyncSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Distributions {
    pub by_status: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    pub top_owners: Vec<OwnerCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OwnerCount {
    pub owner: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncSummary {
    pub jobs_total: u64,
    pub jobs_queued: u64,
    pub jobs_running: u64,
    pub jobs_failed: u64,
    pub latest_job: Option<LatestJob>,
    pub schedules: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LatestJob {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub last_error: Option<String>,
}

/// KPI tiles and distributions ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub kpis: Vec<(String, u64)>,
    pub sync_line: String,
    pub latest_job: Option<String>,
    pub by_status: Vec<(String, u64)>,
    pub by_source: Vec<(String, u64)>,
    pub top_owners: Vec<(String, u64)>,
    pub schedule_count: usize,
}

pub fn request() -> ApiRequest {
    endpoints::summary()
}

pub fn decode(value: Value) -> serde_json::Result<Summary> {
    decode_value(value)
}

pub fn project(summary: &Summary, _ctx: &ProjectionContext<'_>) -> SummaryView {
    let sync = &summary.sync;
    let latest_job = sync.latest_job.as_ref().map(|job| {
        let mut line = format!("{} {} ({})", job.job_type, job.status, job.created_at);
        if let Some(err) = job.last_error.as_deref().filter(|e| !e.is_empty()) {
            line.push_str(&format!(" — {err}"));
        }
        line
    });

    SummaryView {
        kpis: summary
            .totals
            .iter()
            .map(|(k, v)| (humanize_key(k), *v))
            .collect(),
        sync_line: format!(
            "{} jobs: {} queued, {} running, {} failed",
            sync.jobs_total, sync.jobs_queued, sync.jobs_running, sync.jobs_failed
        ),
        latest_job,
        by_status: sorted_desc(&summary.distributions.by_status),
        by_source: sorted_desc(&summary.distributions.by_source),
        top_owners: summary
            .distributions
            .top_owners
            .iter()
            .map(|o| (o.owner.clone(), o.count))
            .collect(),
        schedule_count: sync.schedules.len(),
    }
}

/// `audit_events_last_24h` → `audit events last 24h`.
fn humanize_key(key: &str) -> String {
    key.replace('_', " ")
}

/// Largest buckets first, ties broken by name.
fn sorted_desc(map: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut rows: Vec<(String, u64)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::names::NameIndex;
    use crate::state::query::QueryState;
    use crate::state::scope::ScopeTier;

    #[test]
    fn projects_totals_and_distributions() {
        let summary = decode(json!({
            "totals": {"cis": 120, "open_collisions": 3},
            "distributions": {
                "by_status": {"ACTIVE": 100, "RETIRED": 20},
                "by_source": {"netbox": 5, "backstage": 5},
                "top_owners": [{"owner": "platform", "count": 40}]
            },
            "sync": {
                "jobs_total": 9, "jobs_queued": 1, "jobs_running": 0, "jobs_failed": 2,
                "latest_job": {"id": "j1", "job_type": "netbox_import", "status": "failed",
                               "created_at": "2026-01-01T00:00:00", "last_error": "timeout"},
                "schedules": [{"name": "netbox"}]
            }
        }))
        .unwrap();

        let names = NameIndex::default();
        let query = QueryState::default();
        let view = project(
            &summary,
            &ProjectionContext {
                scope: ScopeTier::Viewer,
                names: &names,
                selected: None,
                query: &query,
            },
        );

        assert_eq!(view.kpis[0], ("cis".to_string(), 120));
        assert_eq!(view.kpis[1], ("open collisions".to_string(), 3));
        assert_eq!(view.sync_line, "9 jobs: 1 queued, 0 running, 2 failed");
        assert_eq!(
            view.latest_job.as_deref(),
            Some("netbox_import failed (2026-01-01T00:00:00) — timeout")
        );
        assert_eq!(view.by_status[0], ("ACTIVE".to_string(), 100));
        assert_eq!(view.by_source[0], ("backstage".to_string(), 5));
        assert_eq!(view.top_owners, vec![("platform".to_string(), 40)]);
        assert_eq!(view.schedule_count, 1);
    }

    #[test]
    fn null_payload_is_an_empty_summary() {
        assert_eq!(decode(Value::Null).unwrap(), Summary::default());
    }
}
