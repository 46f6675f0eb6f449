//! Recent audit activity feed (`GET /dashboard/activity`).

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ProjectionContext, decode_items};
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActivityEvent {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub ci_id: Option<String>,
    pub ci_name: Option<String>,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub at: String,
    pub event_type: String,
    /// CI label, `—` for events not tied to a CI.
    pub subject: String,
}

pub fn request(limit: u32) -> ApiRequest {
    endpoints::activity(limit)
}

pub fn decode(value: Value) -> serde_json::Result<Vec<ActivityEvent>> {
    decode_items(value)
}

pub fn project(events: &[ActivityEvent], ctx: &ProjectionContext<'_>) -> Vec<ActivityRow> {
    events
        .iter()
        .map(|event| {
            let subject = match (event.ci_name.as_deref(), event.ci_id.as_deref()) {
                (Some(name), _) if !name.is_empty() => name.to_string(),
                (_, Some(id)) if !id.is_empty() => ctx.names.label(id),
                _ => "—".to_string(),
            };
            ActivityRow {
                at: event.created_at.clone(),
                event_type: event.event_type.clone(),
                subject,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::names::NameIndex;
    use crate::state::query::QueryState;
    use crate::state::scope::ScopeTier;

    #[test]
    fn subject_prefers_server_name_then_index_then_raw_id() {
        let events = decode(json!({"items": [
            {"id": 1, "ci_id": "ci-1", "ci_name": "db-primary", "event_type": "ci.updated"},
            {"id": 2, "ci_id": "ci-2", "ci_name": null, "event_type": "ci.created"},
            {"id": 3, "ci_id": "ci-3", "event_type": "ci.created"},
            {"id": 4, "ci_id": null, "event_type": "sync.finished"}
        ]}))
        .unwrap();

        let mut names = NameIndex::default();
        names.insert("ci-2", "cache");
        let query = QueryState::default();
        let ctx = ProjectionContext {
            scope: ScopeTier::Viewer,
            names: &names,
            selected: None,
            query: &query,
        };

        let subjects: Vec<String> = project(&events, &ctx).into_iter().map(|r| r.subject).collect();
        assert_eq!(subjects, vec!["db-primary", "cache", "ci-3", "—"]);
        assert_eq!(events[0].id, "1");
    }
}
