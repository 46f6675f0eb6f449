//! Panel loaders: one per dashboard view.
//!
//! Every loader is three pure pieces:
//!
//! - `request(..)` builds the call from the state slice it needs,
//! - `decode(Value)` turns a response into the panel's typed payload,
//! - `project(&payload, &ProjectionContext)` builds the view model.
//!
//! The dispatcher owns the network and the ordering. Loaders never see each
//! other, so each one can be exercised against a hand-built snapshot.

pub mod activity;
pub mod alerts;
pub mod ci_detail;
pub mod ci_list;
pub mod collisions;
pub mod drift;
pub mod graph;
pub mod jobs;
pub mod picker;
pub mod relationships;
pub mod summary;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::state::names::NameIndex;
use crate::state::query::QueryState;
use crate::state::scope::ScopeTier;

/// Last good payload of a panel, or its explicit empty state.
///
/// There is no pending variant: other panels only ever observe one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Empty,
    Ready(T),
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> PanelState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Identifies a load target inside a refresh cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelId {
    Identity,
    Summary,
    Alerts,
    CiList,
    Jobs,
    Collisions,
    Activity,
    CiDetail,
    CiDrift,
    CiGraph,
    CiRelationships,
    Picker,
}

impl PanelId {
    /// Panels whose data belongs to the selected CI.
    pub fn is_selection_scoped(self) -> bool {
        matches!(
            self,
            Self::CiDetail | Self::CiDrift | Self::CiGraph | Self::CiRelationships
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Summary => "summary",
            Self::Alerts => "alerts",
            Self::CiList => "ci list",
            Self::Jobs => "jobs",
            Self::Collisions => "collisions",
            Self::Activity => "activity",
            Self::CiDetail => "ci detail",
            Self::CiDrift => "ci drift",
            Self::CiGraph => "ci graph",
            Self::CiRelationships => "ci relationships",
            Self::Picker => "picker",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last good payload of every panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panels {
    pub summary: PanelState<summary::Summary>,
    pub alerts: PanelState<alerts::AlertSnapshot>,
    pub ci_list: PanelState<ci_list::CiPage>,
    pub jobs: PanelState<Vec<jobs::Job>>,
    pub collisions: PanelState<Vec<collisions::Collision>>,
    pub activity: PanelState<Vec<activity::ActivityEvent>>,
    pub detail: PanelState<ci_detail::CiDetail>,
    pub drift: PanelState<drift::DriftReport>,
    pub graph: PanelState<graph::CiGraph>,
    pub relationships: PanelState<Vec<relationships::RelationshipRecord>>,
    pub picker: PanelState<Vec<picker::PickerEntry>>,
}

impl Panels {
    /// Force every selection-scoped panel to its empty state.
    pub fn clear_selection_scoped(&mut self) {
        self.detail = PanelState::Empty;
        self.drift = PanelState::Empty;
        self.graph = PanelState::Empty;
        self.relationships = PanelState::Empty;
    }

    pub fn selection_scoped_empty(&self) -> bool {
        self.detail.is_empty()
            && self.drift.is_empty()
            && self.graph.is_empty()
            && self.relationships.is_empty()
    }
}

/// Read-only state slice handed to projections.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub scope: ScopeTier,
    pub names: &'a NameIndex,
    pub selected: Option<&'a str>,
    pub query: &'a QueryState,
}

/// Decode a payload, treating `null` as an empty document.
pub(crate) fn decode_value<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    match value {
        Value::Null => serde_json::from_value(Value::Object(Default::default())),
        other => serde_json::from_value(other),
    }
}

/// Decode a list endpoint that may answer with a bare array or `{items: []}`.
pub(crate) fn decode_items<T: DeserializeOwned>(value: Value) -> serde_json::Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(mut map) if map.contains_key("items") => match map.remove("items") {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(items) => serde_json::from_value(items),
        },
        other => serde_json::from_value(other),
    }
}

/// Render an arbitrary JSON scalar for a table cell.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::Null => "—".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ids arrive as strings or integers depending on the table.
pub(crate) mod id_string {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Context over empty state, leaked so tests can hold it as `'static`.
#[cfg(test)]
pub(crate) fn test_context(scope: ScopeTier) -> ProjectionContext<'static> {
    ProjectionContext {
        scope,
        names: Box::leak(Box::default()),
        selected: None,
        query: Box::leak(Box::default()),
    }
}
