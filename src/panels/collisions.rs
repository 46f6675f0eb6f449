//! Governance collisions (`GET /governance/collisions`).
//!
//! Rows carry a resolve affordance while `OPEN` and a reopen affordance
//! otherwise. Viewers see the read-only marker on every row.

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_items};
use crate::api::{ApiRequest, endpoints};
use crate::state::scope::{Control, RowAffordance};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Collision {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub scheme: String,
    pub value: String,
    pub existing_ci_id: String,
    pub incoming_ci_id: String,
    pub status: String,
    pub resolution_note: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
}

impl Collision {
    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("open")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRow {
    pub id: String,
    /// `scheme:value` identity key both sources claimed.
    pub key: String,
    pub existing: String,
    pub incoming: String,
    pub status: String,
    pub note: Option<String>,
    pub affordance: RowAffordance,
}

pub fn request(status: &str) -> ApiRequest {
    endpoints::collisions(status)
}

pub fn decode(value: Value) -> serde_json::Result<Vec<Collision>> {
    decode_items(value)
}

pub fn project(collisions: &[Collision], ctx: &ProjectionContext<'_>) -> Vec<CollisionRow> {
    collisions
        .iter()
        .map(|c| {
            let affordance = if c.is_open() {
                RowAffordance::for_row(ctx.scope, Control::ResolveCollision, "resolve")
            } else {
                RowAffordance::for_row(ctx.scope, Control::ReopenCollision, "reopen")
            };
            CollisionRow {
                id: c.id.clone(),
                key: format!("{}:{}", c.scheme, c.value),
                existing: ctx.names.label(&c.existing_ci_id),
                incoming: ctx.names.label(&c.incoming_ci_id),
                status: c.status.clone(),
                note: c.resolution_note.clone().filter(|n| !n.is_empty()),
                affordance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::panels::test_context;
    use crate::state::scope::ScopeTier;

    fn sample() -> Vec<Collision> {
        decode(json!([
            {"id": 7, "scheme": "serial", "value": "SN-1", "existing_ci_id": "ci-1",
             "incoming_ci_id": "ci-2", "status": "OPEN"},
            {"id": 8, "scheme": "fqdn", "value": "db.local", "existing_ci_id": "ci-3",
             "incoming_ci_id": "ci-4", "status": "RESOLVED", "resolution_note": "merged"}
        ]))
        .unwrap()
    }

    #[test]
    fn operator_gets_resolve_or_reopen_by_status() {
        let rows = project(&sample(), &test_context(ScopeTier::Operator));
        assert_eq!(rows[0].id, "7");
        assert_eq!(rows[0].key, "serial:SN-1");
        assert_eq!(
            rows[0].affordance,
            RowAffordance::Action {
                control: Control::ResolveCollision,
                label: "resolve"
            }
        );
        assert_eq!(
            rows[1].affordance,
            RowAffordance::Action {
                control: Control::ReopenCollision,
                label: "reopen"
            }
        );
        assert_eq!(rows[1].note.as_deref(), Some("merged"));
    }

    #[test]
    fn viewer_rows_are_read_only() {
        let rows = project(&sample(), &test_context(ScopeTier::Viewer));
        assert!(rows.iter().all(|r| r.affordance == RowAffordance::ReadOnly));
    }
}
