//! Dashboard state: one explicit, serializable-where-it-matters object.
//!
//! Loaders receive slices of it by reference through
//! [`ProjectionContext`](crate::panels::ProjectionContext). Only the
//! dispatcher mutates it.

pub mod names;
pub mod query;
pub mod scope;
pub mod selection;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::panels::{Panels, ProjectionContext};
use names::NameIndex;
use query::QueryState;
use scope::ScopeTier;
use selection::Selection;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusLevel {
    #[default]
    Info,
    Success,
    Error,
}

/// The single user-visible status line.
///
/// Errors accumulate onto whatever the current command already reported, so
/// a refresh failure after a successful action keeps the success visible.
/// The dispatcher clears the line when a new command starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
    /// Raw server result attached to a success message.
    pub detail: Option<String>,
}

impl StatusLine {
    pub fn info(&mut self, message: impl Into<String>) {
        *self = Self {
            level: StatusLevel::Info,
            message: message.into(),
            detail: None,
        };
    }

    pub fn success(&mut self, message: impl Into<String>, detail: Option<String>) {
        *self = Self {
            level: StatusLevel::Success,
            message: message.into(),
            detail,
        };
    }

    /// Record an error, appending to anything already on the line.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.level = StatusLevel::Error;
        if self.message.is_empty() {
            self.message = message;
        } else {
            self.message.push_str("; ");
            self.message.push_str(&message);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub query: QueryState,
    pub selection: Selection,
    /// Re-derived on every full refresh, never persisted.
    pub scope: ScopeTier,
    pub principal: Option<String>,
    pub names: NameIndex,
    pub panels: Panels,
    pub status: StatusLine,
}

impl DashboardState {
    /// State restored from a persisted snapshot; panels start empty.
    pub fn from_snapshot(snapshot: UiSnapshot) -> Self {
        Self {
            query: snapshot.query.normalized(),
            selection: Selection::restored(snapshot.selected),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            query: self.query.clone(),
            selected: self.selection.selected().map(str::to_string),
        }
    }

    pub fn context(&self) -> ProjectionContext<'_> {
        ProjectionContext {
            scope: self.scope,
            names: &self.names,
            selected: self.selection.selected(),
            query: &self.query,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted UI snapshot
// ---------------------------------------------------------------------------

/// What survives between invocations: the query and the selected id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSnapshot {
    pub query: QueryState,
    pub selected: Option<String>,
}

impl UiSnapshot {
    /// Read a snapshot, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize ui state")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::query::FilterFields;

    #[test]
    fn error_after_success_keeps_both() {
        let mut status = StatusLine::default();
        status.success("Collision 7 resolved", None);
        status.error("jobs: network error: refused");
        assert!(status.is_error());
        assert_eq!(status.message, "Collision 7 resolved; jobs: network error: refused");
        status.clear();
        assert_eq!(status, StatusLine::default());
    }

    #[test]
    fn errors_accumulate_until_next_message() {
        let mut status = StatusLine::default();
        status.error("summary: 500 Internal Server Error: boom");
        status.error("jobs: network error: refused");
        assert!(status.is_error());
        assert_eq!(
            status.message,
            "summary: 500 Internal Server Error: boom; jobs: network error: refused"
        );

        status.success("Relationship created", Some("{}".to_string()));
        assert_eq!(status.level, StatusLevel::Success);
        assert_eq!(status.message, "Relationship created");
    }

    #[test]
    fn snapshot_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ui-state.json");

        let mut state = DashboardState::default();
        state.query.apply_filters(
            &FilterFields {
                status: "RETIRED".to_string(),
                ..FilterFields::default()
            },
            true,
        );
        state.selection.select("ci-42");
        state.scope = ScopeTier::Operator;
        state.snapshot().save(&path).unwrap();

        let restored = DashboardState::from_snapshot(UiSnapshot::load(&path));
        assert_eq!(restored.query.status, "RETIRED");
        assert_eq!(restored.selection.selected(), Some("ci-42"));
        assert_eq!(restored.scope, ScopeTier::Viewer);
        assert!(restored.panels.selection_scoped_empty());
    }

    #[test]
    fn missing_or_corrupt_snapshot_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui-state.json");
        assert_eq!(UiSnapshot::load(&path), UiSnapshot::default());

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(UiSnapshot::load(&path), UiSnapshot::default());
    }
}
