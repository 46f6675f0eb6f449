//! Authorization tier and the UI-level gate it drives.
//!
//! This gate only mirrors the server's check so operators do not click
//! buttons that will be refused. The server stays authoritative.

use std::fmt;

use serde::Deserialize;

/// Reason shown next to every gated control.
pub const OPERATOR_REQUIRED: &str = "operator scope required";

/// Marker rendered in place of a row action under viewer scope.
pub const READ_ONLY: &str = "read-only";

/// Authorization tier of the current credential. Ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeTier {
    #[default]
    Viewer,
    Operator,
}

impl ScopeTier {
    /// Map the probe's declared scope. Anything unrecognised is `Viewer`.
    pub fn from_declared(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "operator" => Self::Operator,
            _ => Self::Viewer,
        }
    }

    pub fn can_mutate(self) -> bool {
        self == Self::Operator
    }
}

impl fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viewer => write!(f, "viewer"),
            Self::Operator => write!(f, "operator"),
        }
    }
}

/// Response of `GET /dashboard/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub principal: String,
    #[serde(default)]
    pub scope: String,
}

impl Identity {
    pub fn tier(&self) -> ScopeTier {
        ScopeTier::from_declared(&self.scope)
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Every control that changes server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    CreateRelationship,
    DeleteRelationship,
    ResolveCollision,
    ReopenCollision,
    ResolveDrift,
    NetboxImport,
    BackstageSync,
    TriggerSchedule,
    RunLifecycle,
}

impl Control {
    pub const ALL: [Control; 9] = [
        Control::CreateRelationship,
        Control::DeleteRelationship,
        Control::ResolveCollision,
        Control::ReopenCollision,
        Control::ResolveDrift,
        Control::NetboxImport,
        Control::BackstageSync,
        Control::TriggerSchedule,
        Control::RunLifecycle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CreateRelationship => "create relationship",
            Self::DeleteRelationship => "delete relationship",
            Self::ResolveCollision => "resolve collision",
            Self::ReopenCollision => "reopen collision",
            Self::ResolveDrift => "resolve drift",
            Self::NetboxImport => "netbox import",
            Self::BackstageSync => "backstage sync",
            Self::TriggerSchedule => "trigger schedule",
            Self::RunLifecycle => "run lifecycle",
        }
    }
}

/// Whether a control can be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Enabled,
    Disabled { reason: &'static str },
}

impl ControlState {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Gate a mutating control by tier.
pub fn gate(tier: ScopeTier, _control: Control) -> ControlState {
    if tier.can_mutate() {
        ControlState::Enabled
    } else {
        ControlState::Disabled {
            reason: OPERATOR_REQUIRED,
        }
    }
}

/// Row-local affordance for relationship and collision rows.
///
/// Viewers get a fixed marker rather than a disabled button, so the column
/// keeps its width without suggesting the action exists for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAffordance {
    Action { control: Control, label: &'static str },
    ReadOnly,
}

impl RowAffordance {
    pub fn for_row(tier: ScopeTier, control: Control, label: &'static str) -> Self {
        match gate(tier, control) {
            ControlState::Enabled => Self::Action { control, label },
            ControlState::Disabled { .. } => Self::ReadOnly,
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scopes_fail_closed() {
        assert_eq!(ScopeTier::from_declared("operator"), ScopeTier::Operator);
        assert_eq!(ScopeTier::from_declared(" Operator "), ScopeTier::Operator);
        assert_eq!(ScopeTier::from_declared("viewer"), ScopeTier::Viewer);
        assert_eq!(ScopeTier::from_declared("approver"), ScopeTier::Viewer);
        assert_eq!(ScopeTier::from_declared("admin"), ScopeTier::Viewer);
        assert_eq!(ScopeTier::from_declared(""), ScopeTier::Viewer);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(ScopeTier::Operator > ScopeTier::Viewer);
        assert_eq!(ScopeTier::default(), ScopeTier::Viewer);
    }

    #[test]
    fn viewer_disables_every_control() {
        for control in Control::ALL {
            assert_eq!(
                gate(ScopeTier::Viewer, control),
                ControlState::Disabled {
                    reason: OPERATOR_REQUIRED
                }
            );
            assert!(gate(ScopeTier::Operator, control).is_enabled());
        }
    }

    #[test]
    fn row_affordance_follows_tier() {
        let viewer = RowAffordance::for_row(ScopeTier::Viewer, Control::DeleteRelationship, "delete");
        assert_eq!(viewer, RowAffordance::ReadOnly);
        let operator =
            RowAffordance::for_row(ScopeTier::Operator, Control::DeleteRelationship, "delete");
        assert!(operator.is_action());
    }

    #[test]
    fn identity_decodes_with_missing_fields() {
        let id: Identity = serde_json::from_str(r#"{"scope":"operator"}"#).unwrap();
        assert_eq!(id.tier(), ScopeTier::Operator);
        assert!(id.principal.is_empty());
    }
}
