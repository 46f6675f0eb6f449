//! Mutating actions: what each one calls, how it is validated, and what it
//! reports on success.

use crate::api::endpoints::{self, SyncFlags};
use crate::api::{ApiError, ApiRequest};
use crate::panels::drift::SOURCES;
use crate::state::scope::Control;

/// Provenance recorded on relationships created from the dashboard.
pub const DEFAULT_RELATIONSHIP_SOURCE: &str = "manual";

pub const DEFAULT_RESOLVE_NOTE: &str = "resolved via dashboard";
pub const DEFAULT_REOPEN_NOTE: &str = "reopened via dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateRelationship {
        source_ci_id: String,
        target_ci_id: String,
        relation_type: String,
        source: String,
    },
    DeleteRelationship {
        id: String,
    },
    ResolveCollision {
        id: String,
        note: String,
    },
    ReopenCollision {
        id: String,
        note: String,
    },
    ResolveDrift {
        ci_id: String,
        source: String,
        fields: Vec<String>,
    },
    NetboxImport(SyncFlags),
    BackstageSync(SyncFlags),
    TriggerSchedule {
        name: String,
    },
    RunLifecycle,
}

impl Action {
    pub fn control(&self) -> Control {
        match self {
            Self::CreateRelationship { .. } => Control::CreateRelationship,
            Self::DeleteRelationship { .. } => Control::DeleteRelationship,
            Self::ResolveCollision { .. } => Control::ResolveCollision,
            Self::ReopenCollision { .. } => Control::ReopenCollision,
            Self::ResolveDrift { .. } => Control::ResolveDrift,
            Self::NetboxImport(_) => Control::NetboxImport,
            Self::BackstageSync(_) => Control::BackstageSync,
            Self::TriggerSchedule { .. } => Control::TriggerSchedule,
            Self::RunLifecycle => Control::RunLifecycle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.control().label()
    }

    /// Local preconditions, checked before any network I/O.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self {
            Self::CreateRelationship {
                source_ci_id,
                target_ci_id,
                relation_type,
                ..
            } => {
                require(source_ci_id, "source CI is required")?;
                require(target_ci_id, "target CI is required")?;
                require(relation_type, "relation type is required")?;
                if source_ci_id.trim() == target_ci_id.trim() {
                    return Err(ApiError::validation(
                        "source and target CI must be different",
                    ));
                }
                Ok(())
            }
            Self::DeleteRelationship { id } => require(id, "relationship id is required"),
            Self::ResolveCollision { id, .. } | Self::ReopenCollision { id, .. } => {
                require(id, "collision id is required")
            }
            Self::ResolveDrift {
                ci_id,
                source,
                fields,
            } => {
                require(ci_id, "select a CI before resolving drift")?;
                if !SOURCES.contains(&source.trim()) {
                    return Err(ApiError::validation(format!(
                        "drift source must be one of: {}",
                        SOURCES.join(", ")
                    )));
                }
                if fields.iter().all(|f| f.trim().is_empty()) {
                    return Err(ApiError::validation(
                        "select at least one drift field to resolve",
                    ));
                }
                Ok(())
            }
            Self::TriggerSchedule { name } => require(name, "schedule name is required"),
            Self::NetboxImport(_) | Self::BackstageSync(_) | Self::RunLifecycle => Ok(()),
        }
    }

    pub fn request(&self) -> ApiRequest {
        match self {
            Self::CreateRelationship {
                source_ci_id,
                target_ci_id,
                relation_type,
                source,
            } => {
                let source = match source.trim() {
                    "" => DEFAULT_RELATIONSHIP_SOURCE,
                    s => s,
                };
                endpoints::create_relationship(
                    source_ci_id.trim(),
                    target_ci_id.trim(),
                    relation_type.trim(),
                    source,
                )
            }
            Self::DeleteRelationship { id } => endpoints::delete_relationship(id.trim()),
            Self::ResolveCollision { id, note } => {
                endpoints::resolve_collision(id.trim(), note_or(note, DEFAULT_RESOLVE_NOTE))
            }
            Self::ReopenCollision { id, note } => {
                endpoints::reopen_collision(id.trim(), note_or(note, DEFAULT_REOPEN_NOTE))
            }
            Self::ResolveDrift {
                ci_id,
                source,
                fields,
            } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect();
                endpoints::resolve_drift(ci_id.trim(), source.trim(), &fields)
            }
            Self::NetboxImport(flags) => endpoints::netbox_import(flags),
            Self::BackstageSync(flags) => endpoints::backstage_sync(flags),
            Self::TriggerSchedule { name } => endpoints::trigger_schedule(name.trim()),
            Self::RunLifecycle => endpoints::lifecycle_run(),
        }
    }

    pub fn success_message(&self) -> String {
        match self {
            Self::CreateRelationship {
                source_ci_id,
                target_ci_id,
                relation_type,
                ..
            } => format!("Relationship created: {source_ci_id} --{relation_type}--> {target_ci_id}"),
            Self::DeleteRelationship { id } => format!("Relationship {id} deleted"),
            Self::ResolveCollision { id, .. } => format!("Collision {id} resolved"),
            Self::ReopenCollision { id, .. } => format!("Collision {id} reopened"),
            Self::ResolveDrift { source, .. } => format!("Drift resolved against {source}"),
            Self::NetboxImport(flags) => sync_message("NetBox import", flags),
            Self::BackstageSync(flags) => sync_message("Backstage sync", flags),
            Self::TriggerSchedule { name } => format!("Schedule {name} triggered"),
            Self::RunLifecycle => "Lifecycle run completed".to_string(),
        }
    }
}

fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::validation(message))
    } else {
        Ok(())
    }
}

fn note_or<'a>(note: &'a str, fallback: &'a str) -> &'a str {
    match note.trim() {
        "" => fallback,
        n => n,
    }
}

fn sync_message(what: &str, flags: &SyncFlags) -> String {
    let mut message = if flags.async_job {
        format!("{what} queued")
    } else {
        format!("{what} completed")
    };
    if flags.dry_run {
        message.push_str(" (dry run)");
    }
    message
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::Method;

    fn drift(fields: &[&str]) -> Action {
        Action::ResolveDrift {
            ci_id: "ci-42".to_string(),
            source: "netbox".to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn drift_without_fields_is_a_validation_error() {
        assert!(matches!(drift(&[]).validate(), Err(ApiError::Validation(_))));
        assert!(matches!(drift(&[" "]).validate(), Err(ApiError::Validation(_))));
        assert!(drift(&["name"]).validate().is_ok());
    }

    #[test]
    fn drift_rejects_unknown_source() {
        let action = Action::ResolveDrift {
            ci_id: "ci-42".to_string(),
            source: "jira".to_string(),
            fields: vec!["name".to_string()],
        };
        assert!(action.validate().is_err());
    }

    #[test]
    fn drift_request_drops_blank_fields() {
        let req = drift(&["name", " ", "owner"]).request();
        assert_eq!(req.target(), "/cis/ci-42/drift/resolve");
        assert_eq!(
            req.body,
            Some(json!({"source": "netbox", "fields": ["name", "owner"]}))
        );
    }

    #[test]
    fn create_relationship_checks_fields() {
        let make = |s: &str, t: &str, r: &str| Action::CreateRelationship {
            source_ci_id: s.to_string(),
            target_ci_id: t.to_string(),
            relation_type: r.to_string(),
            source: String::new(),
        };
        assert!(make("", "b", "x").validate().is_err());
        assert!(make("a", "b", "").validate().is_err());
        assert!(make("a", "a", "x").validate().is_err());

        let ok = make("a", "b", "depends_on");
        assert!(ok.validate().is_ok());
        let req = ok.request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_ref().unwrap()["source"], "manual");
    }

    #[test]
    fn collision_note_defaults() {
        let req = Action::ReopenCollision {
            id: "7".to_string(),
            note: "  ".to_string(),
        }
        .request();
        assert_eq!(req.target(), "/governance/collisions/7/reopen");
        assert_eq!(req.body, Some(json!({"resolution_note": DEFAULT_REOPEN_NOTE})));
    }

    #[test]
    fn sync_messages_reflect_flags() {
        let flags = SyncFlags {
            async_job: true,
            dry_run: true,
            ..SyncFlags::default()
        };
        assert_eq!(
            Action::NetboxImport(flags).success_message(),
            "NetBox import queued (dry run)"
        );
        assert_eq!(Action::RunLifecycle.control(), Control::RunLifecycle);
    }
}
