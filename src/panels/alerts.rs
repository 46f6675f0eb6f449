//! Alert rule snapshot (`GET /dashboard/alerts`).

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_value};
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertSnapshot {
    pub generated_at: String,
    pub window_seconds: u64,
    pub rules: Vec<AlertRule>,
    pub active_alerts: Vec<AlertRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertRule {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub event: String,
    pub threshold: u64,
    pub current: u64,
    pub severity: String,
    pub message: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRow {
    pub severity: String,
    pub message: String,
    pub progress: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertsView {
    pub headline: String,
    pub rows: Vec<AlertRow>,
}

pub fn request() -> ApiRequest {
    endpoints::alerts()
}

pub fn decode(value: Value) -> serde_json::Result<AlertSnapshot> {
    decode_value(value)
}

/// Active rules first, then the rest in server order.
pub fn project(snapshot: &AlertSnapshot, _ctx: &ProjectionContext<'_>) -> AlertsView {
    let active = snapshot.rules.iter().filter(|r| r.active).count();
    let active = active.max(snapshot.active_alerts.len());
    let headline = if active == 0 {
        format!("no active alerts ({}s window)", snapshot.window_seconds)
    } else {
        format!("{active} active alert(s) ({}s window)", snapshot.window_seconds)
    };

    let mut rules: Vec<&AlertRule> = snapshot.rules.iter().collect();
    rules.sort_by_key(|r| !r.active);

    AlertsView {
        headline,
        rows: rules
            .into_iter()
            .map(|r| AlertRow {
                severity: r.severity.clone(),
                message: if r.message.is_empty() {
                    r.event.clone()
                } else {
                    r.message.clone()
                },
                progress: format!("{}/{}", r.current, r.threshold),
                active: r.active,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::panels::test_context;
    use crate::state::scope::ScopeTier;

    #[test]
    fn active_rules_sort_first() {
        let snapshot = decode(json!({
            "generated_at": "2026-01-01T00:00:00",
            "window_seconds": 300,
            "rules": [
                {"id": "a", "event": "auth.failed", "threshold": 10, "current": 2,
                 "severity": "warning", "message": "", "active": false},
                {"id": "b", "event": "sync.failed", "threshold": 1, "current": 4,
                 "severity": "critical", "message": "sync failures", "active": true}
            ],
            "active_alerts": [{"id": "b", "active": true}]
        }))
        .unwrap();

        let view = project(&snapshot, &test_context(ScopeTier::Viewer));
        assert_eq!(view.headline, "1 active alert(s) (300s window)");
        assert_eq!(view.rows[0].message, "sync failures");
        assert_eq!(view.rows[0].progress, "4/1");
        assert_eq!(view.rows[1].message, "auth.failed");
    }

    #[test]
    fn quiet_snapshot() {
        let view = project(&AlertSnapshot::default(), &test_context(ScopeTier::Viewer));
        assert_eq!(view.headline, "no active alerts (0s window)");
        assert!(view.rows.is_empty());
    }
}
