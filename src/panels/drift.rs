//! Per-source drift report for the selected CI (`GET /cis/{id}/drift`).

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ProjectionContext, cell, decode_value};
use crate::api::{ApiRequest, endpoints};
use crate::state::scope::{Control, ControlState, gate};

/// Sources the server compares against, in display order.
pub const SOURCES: [&str; 2] = ["netbox", "backstage"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriftReport {
    pub ci_id: String,
    pub overall_status: String,
    pub cmdb: Map<String, Value>,
    pub netbox: SourceDrift,
    pub backstage: SourceDrift,
}

impl DriftReport {
    pub fn source(&self, name: &str) -> Option<&SourceDrift> {
        match name {
            "netbox" => Some(&self.netbox),
            "backstage" => Some(&self.backstage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceDrift {
    pub status: String,
    pub reason: Option<String>,
    pub mismatches: Vec<Mismatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Mismatch {
    pub field: String,
    pub cmdb: Value,
    pub target: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchRow {
    pub field: String,
    pub cmdb: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceView {
    pub source: &'static str,
    pub status: String,
    pub reason: Option<String>,
    pub mismatches: Vec<MismatchRow>,
    /// Only meaningful when there are mismatches to resolve.
    pub resolve: Option<ControlState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftView {
    pub overall: String,
    pub sources: Vec<SourceView>,
}

pub fn request(ci_id: &str) -> ApiRequest {
    endpoints::ci_drift(ci_id)
}

pub fn decode(value: Value) -> serde_json::Result<DriftReport> {
    decode_value(value)
}

pub fn project(report: &DriftReport, ctx: &ProjectionContext<'_>) -> DriftView {
    let sources = SOURCES
        .into_iter()
        .filter_map(|name| report.source(name).map(|drift| (name, drift)))
        .map(|(name, drift)| SourceView {
            source: name,
            status: if drift.status.is_empty() {
                "unknown".to_string()
            } else {
                drift.status.clone()
            },
            reason: drift.reason.clone().filter(|r| !r.is_empty()),
            mismatches: drift
                .mismatches
                .iter()
                .map(|m| MismatchRow {
                    field: m.field.clone(),
                    cmdb: cell(&m.cmdb),
                    target: cell(&m.target),
                })
                .collect(),
            resolve: (!drift.mismatches.is_empty()).then(|| gate(ctx.scope, Control::ResolveDrift)),
        })
        .collect();

    DriftView {
        overall: if report.overall_status.is_empty() {
            "unknown".to_string()
        } else {
            report.overall_status.clone()
        },
        sources,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::panels::test_context;
    use crate::state::scope::{OPERATOR_REQUIRED, ScopeTier};

    fn sample() -> DriftReport {
        decode(json!({
            "ci_id": "ci-42",
            "overall_status": "drift",
            "cmdb": {"name": "db-primary"},
            "netbox": {"status": "drift", "mismatches": [
                {"field": "name", "cmdb": "db-primary", "target": "db-01"}
            ]},
            "backstage": {"status": "unavailable", "reason": "backstage_catalog_url_missing"}
        }))
        .unwrap()
    }

    #[test]
    fn resolve_offered_only_where_mismatches_exist() {
        let view = project(&sample(), &test_context(ScopeTier::Operator));
        assert_eq!(view.overall, "drift");
        assert_eq!(view.sources[0].source, "netbox");
        assert_eq!(view.sources[0].mismatches[0].target, "db-01");
        assert_eq!(view.sources[0].resolve, Some(ControlState::Enabled));
        assert_eq!(view.sources[1].resolve, None);
        assert_eq!(
            view.sources[1].reason.as_deref(),
            Some("backstage_catalog_url_missing")
        );
    }

    #[test]
    fn viewer_sees_reason_on_resolve() {
        let view = project(&sample(), &test_context(ScopeTier::Viewer));
        assert_eq!(
            view.sources[0].resolve,
            Some(ControlState::Disabled {
                reason: OPERATOR_REQUIRED
            })
        );
    }

    #[test]
    fn unknown_source_lookup() {
        assert!(sample().source("jira").is_none());
    }
}
