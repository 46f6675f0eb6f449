//! Central dispatcher: every user command goes through here.
//!
//! A command runs in three steps:
//!
//! 1. [`Dashboard::begin`] applies the synchronous part (query edits,
//!    selection changes, mutating calls) and plans the loads it needs.
//! 2. [`Dashboard::fetch`] issues one stage of loads concurrently and
//!    collects a [`Patch`] per load. Nothing is mutated here.
//! 3. [`Dashboard::apply`] folds patches into state in a fixed order,
//!    dropping selection-scoped patches whose ticket was superseded, and
//!    returns any follow-up loads (auto-selection) as the next stage.
//!
//! [`Dashboard::execute`] drives the three until no loads remain.

pub mod actions;
pub mod export;

use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use chrono::Utc;
use serde_json::Value;

use crate::api::{ApiClient, ApiError, ApiRequest, endpoints};
use crate::config::schema::DashboardConfig;
use crate::journal::{Journal, JournalEntry, Outcome};
use crate::panels::{
    PanelId, PanelState, activity, alerts, ci_detail, ci_list, collisions, decode_value, drift,
    graph, jobs, picker, relationships, summary,
};
use crate::state::DashboardState;
use crate::state::query::FilterFields;
use crate::state::scope::{ControlState, Identity, gate};
use crate::state::selection::{ListReconcile, SelectionTicket};

pub use actions::Action;
pub use export::ExportKind;

// ---------------------------------------------------------------------------
// Commands, loads and patches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Full refresh cascade.
    Refresh,
    ApplyFilters {
        fields: FilterFields,
        reset_offset: bool,
    },
    ResetFilters,
    NextPage,
    PrevPage,
    Select(String),
    /// Search the entity picker.
    Pick(String),
    Run(Action),
    Export {
        kind: ExportKind,
        path: Option<PathBuf>,
    },
}

/// One planned read.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub panel: PanelId,
    pub request: ApiRequest,
    /// Set for selection-scoped loads; checked again when the patch lands.
    pub ticket: Option<SelectionTicket>,
    /// Offset the CI list was requested at.
    pub page_offset: u32,
}

impl Load {
    fn panel(panel: PanelId, request: ApiRequest) -> Self {
        Self {
            panel,
            request,
            ticket: None,
            page_offset: 0,
        }
    }
}

/// Result of one load, waiting to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub load: Load,
    pub outcome: Result<Value, ApiError>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard {
    client: ApiClient,
    settings: DashboardConfig,
    journal: Journal,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(
        client: ApiClient,
        settings: DashboardConfig,
        journal: Journal,
        state: DashboardState,
    ) -> Self {
        Self {
            client,
            settings,
            journal,
            state,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Run a command and every stage it leads to.
    pub fn execute(&mut self, command: Command) {
        let mut loads = self.begin(command);
        while !loads.is_empty() {
            let patches = self.fetch(loads);
            loads = self.apply(patches);
        }
    }

    /// Apply the synchronous half of `command` and plan its first stage.
    pub fn begin(&mut self, command: Command) -> Vec<Load> {
        self.state.status.clear();
        match command {
            Command::Refresh => {
                self.state.status.info("Dashboard refreshed");
                self.full_refresh()
            }
            Command::ApplyFilters {
                fields,
                reset_offset,
            } => {
                self.state.query.apply_filters(&fields, reset_offset);
                self.state.status.info("Filters applied");
                vec![self.list_load()]
            }
            Command::ResetFilters => {
                self.state.query.reset();
                self.state.status.info("Filters reset");
                vec![self.list_load()]
            }
            Command::NextPage => {
                let Some(window) = self.state.panels.ci_list.ready().map(|page| page.window())
                else {
                    self.state.status.info("No CI page loaded yet");
                    return Vec::new();
                };
                // The shown page must be the one the query points at, or the
                // step lands somewhere the operator never saw.
                if window.offset != self.state.query.offset() {
                    self.state
                        .status
                        .info("CI list is out of date, refresh before paging");
                    return Vec::new();
                }
                if !window.has_next() {
                    self.state.status.info("Already on the last page");
                    return Vec::new();
                }
                self.state.query.next_page();
                vec![self.list_load()]
            }
            Command::PrevPage => {
                if !self.state.query.prev_page() {
                    self.state.status.info("Already on the first page");
                    return Vec::new();
                }
                vec![self.list_load()]
            }
            Command::Select(id) => {
                let id = id.trim();
                if id.is_empty() {
                    self.state
                        .status
                        .error(ApiError::validation("CI id is required").to_string());
                    return Vec::new();
                }
                let ticket = self.state.selection.select(id);
                // Old entity data must never stay visible under the new id.
                self.state.panels.clear_selection_scoped();
                self.state
                    .status
                    .info(format!("Selected {}", self.state.names.label(id)));
                self.selection_loads(&ticket)
            }
            Command::Pick(search) => {
                vec![Load::panel(
                    PanelId::Picker,
                    picker::request(&search, self.settings.picker_limit),
                )]
            }
            Command::Run(action) => self.run_action(action),
            Command::Export { kind, path } => {
                self.export(kind, path);
                Vec::new()
            }
        }
    }

    /// Issue one stage of loads. Independent loads run concurrently.
    pub fn fetch(&self, loads: Vec<Load>) -> Vec<Patch> {
        let client = &self.client;
        if loads.len() <= 1 {
            return loads
                .into_iter()
                .map(|load| {
                    let outcome = client.call(&load.request);
                    Patch { load, outcome }
                })
                .collect();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = loads
                .into_iter()
                .map(|load| {
                    let fallback = load.clone();
                    let handle = scope.spawn(move || {
                        let outcome = client.call(&load.request);
                        Patch { load, outcome }
                    });
                    (fallback, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(fallback, handle)| {
                    handle.join().unwrap_or_else(|_| Patch {
                        load: fallback,
                        outcome: Err(ApiError::Network {
                            message: "load thread panicked".to_string(),
                        }),
                    })
                })
                .collect()
        })
    }

    /// Fold a stage of patches into state. Returns the next stage.
    pub fn apply(&mut self, mut patches: Vec<Patch>) -> Vec<Load> {
        // Identity first, list before selection-scoped panels.
        patches.sort_by_key(|p| p.load.panel);

        let mut follow_ups = Vec::new();
        let mut auth_reported = false;

        for Patch { load, outcome } in patches {
            // Selection data only lands under the ticket it was requested for.
            if load.panel.is_selection_scoped() {
                let current = load
                    .ticket
                    .as_ref()
                    .is_some_and(|ticket| self.state.selection.is_current(ticket));
                if !current {
                    tracing::debug!(panel = %load.panel, "discarding superseded patch");
                    continue;
                }
            }

            let value = match outcome {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(panel = %load.panel, kind = err.kind(), error = %err, "panel load failed");
                    if err == ApiError::Auth {
                        if !auth_reported {
                            self.state.status.error(err.to_string());
                        }
                        auth_reported = true;
                    } else {
                        self.state.status.error(format!("{}: {err}", load.panel));
                    }
                    continue;
                }
            };

            tracing::debug!(panel = %load.panel, "applying patch");
            if let Err(err) = self.apply_value(&load, value, &mut follow_ups) {
                tracing::warn!(panel = %load.panel, error = %err, "malformed panel payload");
                self.state
                    .status
                    .error(format!("{}: malformed response: {err}", load.panel));
            }
        }

        follow_ups
    }

    // -- Planning --

    /// Every independent panel plus the current selection's panels.
    fn full_refresh(&self) -> Vec<Load> {
        let s = &self.settings;
        let mut loads = vec![
            Load::panel(PanelId::Identity, endpoints::identity()),
            Load::panel(PanelId::Summary, summary::request()),
            Load::panel(PanelId::Alerts, alerts::request()),
            self.list_load(),
            Load::panel(PanelId::Jobs, jobs::request(s.jobs_limit)),
            Load::panel(PanelId::Collisions, collisions::request(&s.collision_status)),
            Load::panel(PanelId::Activity, activity::request(s.activity_limit)),
        ];
        if let Some(ticket) = self.state.selection.ticket() {
            loads.extend(self.selection_loads(&ticket));
        }
        loads
    }

    fn list_load(&self) -> Load {
        Load {
            page_offset: self.state.query.offset(),
            ..Load::panel(PanelId::CiList, ci_list::request(&self.state.query))
        }
    }

    /// Detail, drift, graph and relationships of one selection.
    fn selection_loads(&self, ticket: &SelectionTicket) -> Vec<Load> {
        let id = ticket.id.as_str();
        [
            (PanelId::CiDetail, ci_detail::request(id)),
            (PanelId::CiDrift, drift::request(id)),
            (PanelId::CiGraph, graph::request(id)),
            (
                PanelId::CiRelationships,
                relationships::request(id, self.settings.relationships_limit),
            ),
        ]
        .into_iter()
        .map(|(panel, request)| Load {
            ticket: Some(ticket.clone()),
            ..Load::panel(panel, request)
        })
        .collect()
    }

    // -- Application --

    fn apply_value(
        &mut self,
        load: &Load,
        value: Value,
        follow_ups: &mut Vec<Load>,
    ) -> serde_json::Result<()> {
        let state = &mut self.state;
        match load.panel {
            PanelId::Identity => {
                let identity: Identity = decode_value(value)?;
                state.scope = identity.tier();
                state.principal = Some(identity.principal).filter(|p| !p.is_empty());
            }
            PanelId::Summary => state.panels.summary = PanelState::Ready(summary::decode(value)?),
            PanelId::Alerts => state.panels.alerts = PanelState::Ready(alerts::decode(value)?),
            PanelId::CiList => {
                let page = ci_list::decode(value, load.page_offset)?;
                for ci in &page.items {
                    state.names.insert(&ci.id, &ci.name);
                }
                let reconcile = state
                    .selection
                    .reconcile_with_list(page.total, page.first_id());
                state.panels.ci_list = PanelState::Ready(page);
                match reconcile {
                    ListReconcile::AutoSelected(ticket) => {
                        tracing::debug!(ci = %ticket.id, "auto-selected first row");
                        state.panels.clear_selection_scoped();
                        follow_ups.extend(self.selection_loads(&ticket));
                    }
                    ListReconcile::Cleared => {
                        tracing::debug!("empty result, selection cleared");
                        state.panels.clear_selection_scoped();
                    }
                    ListReconcile::Kept | ListReconcile::Idle => {}
                }
            }
            PanelId::Jobs => state.panels.jobs = PanelState::Ready(jobs::decode(value)?),
            PanelId::Collisions => {
                state.panels.collisions = PanelState::Ready(collisions::decode(value)?)
            }
            PanelId::Activity => {
                let events = activity::decode(value)?;
                for e in &events {
                    if let (Some(id), Some(name)) = (&e.ci_id, &e.ci_name) {
                        state.names.insert(id, name);
                    }
                }
                state.panels.activity = PanelState::Ready(events);
            }
            PanelId::CiDetail => {
                let detail = ci_detail::decode(value)?;
                state.names.insert(&detail.ci.id, &detail.ci.name);
                state.panels.detail = PanelState::Ready(detail);
            }
            PanelId::CiDrift => state.panels.drift = PanelState::Ready(drift::decode(value)?),
            PanelId::CiGraph => {
                let graph = graph::decode(value)?;
                if let Some(ci) = &graph.ci {
                    state.names.insert(&ci.id, &ci.name);
                }
                state.panels.graph = PanelState::Ready(graph);
            }
            PanelId::CiRelationships => {
                state.panels.relationships = PanelState::Ready(relationships::decode(value)?)
            }
            PanelId::Picker => {
                let entries = picker::decode(value)?;
                for e in &entries {
                    state.names.insert(&e.id, &e.name);
                }
                state.panels.picker = PanelState::Ready(entries);
            }
        }
        Ok(())
    }

    // -- Actions --

    /// Gate, validate, call. Only success leads to a refresh; a failure
    /// touches nothing but the status line.
    fn run_action(&mut self, action: Action) -> Vec<Load> {
        let name = action.name();
        let request = action.request();
        let target = request.to_string();

        if let ControlState::Disabled { reason } = gate(self.state.scope, action.control()) {
            self.state.status.error(format!("{name}: {reason}"));
            self.journal
                .record(&JournalEntry::new(name, &target, Outcome::Blocked, reason));
            return Vec::new();
        }

        if let Err(err) = action.validate() {
            self.state.status.error(format!("{name}: {err}"));
            self.journal.record(&JournalEntry::new(
                name,
                &target,
                Outcome::Error,
                &err.to_string(),
            ));
            return Vec::new();
        }

        match self.client.call(&request) {
            Ok(result) => {
                let message = action.success_message();
                tracing::debug!(action = name, target = %target, "action succeeded");
                self.journal
                    .record(&JournalEntry::new(name, &target, Outcome::Ok, &message));
                let detail = match result {
                    Value::Null => None,
                    other => serde_json::to_string(&other).ok(),
                };
                self.state.status.success(message, detail);
                self.full_refresh()
            }
            Err(err) => {
                tracing::warn!(action = name, target = %target, kind = err.kind(), error = %err, "action failed");
                self.journal.record(&JournalEntry::new(
                    name,
                    &target,
                    Outcome::Error,
                    &err.to_string(),
                ));
                self.state.status.error(format!("{name} failed: {err}"));
                Vec::new()
            }
        }
    }

    fn export(&mut self, kind: ExportKind, path: Option<PathBuf>) {
        let request = kind.request(self.settings.export_limit);
        let target = request.to_string();
        let path = path.unwrap_or_else(|| kind.default_path(Utc::now()));

        let saved = self
            .client
            .download(&request)
            .map_err(anyhow::Error::from)
            .and_then(|body| {
                fs::write(&path, &body)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                Ok(body.len())
            });

        match saved {
            Ok(bytes) => {
                let message = format!("Saved {} to {} ({bytes} bytes)", kind.label(), path.display());
                self.journal
                    .record(&JournalEntry::new(kind.label(), &target, Outcome::Ok, &message));
                self.state.status.success(message, None);
            }
            Err(err) => {
                let message = format!("{} failed: {err:#}", kind.label());
                self.journal
                    .record(&JournalEntry::new(kind.label(), &target, Outcome::Error, &message));
                self.state.status.error(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::api::{HttpRequest, RawResponse, Transport};
    use crate::session::MemorySessionStore;
    use crate::state::scope::ScopeTier;

    /// Answers by path; records every URL it sees.
    #[derive(Default)]
    struct Routes {
        seen: Mutex<Vec<String>>,
    }

    impl Transport for Routes {
        fn send(&self, request: &HttpRequest<'_>) -> Result<RawResponse, ApiError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.url.to_string());
            }
            let body = if request.url.contains("/dashboard/me") {
                json!({"principal": "ops", "scope": "operator"})
            } else if request.url.contains("/cis?") {
                json!({"items": [{"id": "ci-1", "name": "alpha"}], "total": 1})
            } else {
                json!({"items": []})
            };
            Ok(RawResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: body.to_string(),
            })
        }
    }

    fn dashboard(routes: &Arc<Routes>) -> Dashboard {
        let client = ApiClient::new(
            "http://cmdb.test",
            Arc::new(MemorySessionStore::new(Some("t"))),
            Box::new(Arc::clone(routes)),
        )
        .unwrap();
        Dashboard::new(
            client,
            DashboardConfig::default(),
            Journal::disabled(),
            DashboardState::default(),
        )
    }

    #[test]
    fn refresh_auto_selects_and_loads_selection_panels() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        dash.execute(Command::Refresh);

        let state = dash.state();
        assert_eq!(state.scope, ScopeTier::Operator);
        assert_eq!(state.principal.as_deref(), Some("ops"));
        assert_eq!(state.selection.selected(), Some("ci-1"));
        assert!(state.panels.detail.ready().is_some());
        assert!(state.panels.relationships.ready().is_some());
        assert_eq!(state.names.label("ci-1"), "alpha");
        assert!(!state.status.is_error(), "{}", state.status.message);
    }

    #[test]
    fn stale_selection_patches_are_dropped() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);

        let for_a = dash.begin(Command::Select("A".to_string()));
        let for_b = dash.begin(Command::Select("B".to_string()));
        let late_a = dash.fetch(for_a);
        let b = dash.fetch(for_b);

        dash.apply(b);
        let detail_b = dash.state().panels.detail.clone();
        dash.apply(late_a);
        assert_eq!(dash.state().panels.detail, detail_b);
        assert_eq!(dash.state().selection.selected(), Some("B"));
    }

    #[test]
    fn malformed_payload_keeps_last_good_value() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        dash.state.panels.jobs = PanelState::Ready(Vec::new());

        dash.apply(vec![Patch {
            load: Load::panel(PanelId::Jobs, jobs::request(20)),
            outcome: Ok(json!("not a list")),
        }]);
        assert_eq!(dash.state().panels.jobs, PanelState::Ready(Vec::new()));
        assert!(dash.state().status.message.starts_with("jobs: malformed response:"));
    }

    #[test]
    fn identity_failure_keeps_previous_scope() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        dash.state.scope = ScopeTier::Operator;

        dash.apply(vec![Patch {
            load: Load::panel(PanelId::Identity, endpoints::identity()),
            outcome: Err(ApiError::Network {
                message: "refused".to_string(),
            }),
        }]);
        assert_eq!(dash.state().scope, ScopeTier::Operator);
        assert_eq!(dash.state().status.message, "identity: network error: refused");
    }

    #[test]
    fn auth_error_is_reported_once_per_stage() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        let patches = [PanelId::Summary, PanelId::Jobs]
            .into_iter()
            .map(|panel| Patch {
                load: Load::panel(panel, summary::request()),
                outcome: Err(ApiError::Auth),
            })
            .collect();
        dash.apply(patches);
        assert_eq!(dash.state().status.message, ApiError::Auth.to_string());
    }

    #[test]
    fn next_page_needs_a_known_next_page() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        assert!(dash.begin(Command::NextPage).is_empty());
        assert_eq!(dash.state().query.offset(), 0);
        assert!(dash.begin(Command::PrevPage).is_empty());
    }

    #[test]
    fn selection_patch_without_ticket_is_dropped() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        dash.state.selection.select("ci-1");

        dash.apply(vec![Patch {
            load: Load::panel(PanelId::CiDetail, ci_detail::request("ci-1")),
            outcome: Ok(json!({"ci": {"id": "ci-1", "name": "alpha"}})),
        }]);
        assert_eq!(dash.state().panels.detail, PanelState::Empty);
    }

    #[test]
    fn next_page_refused_while_shown_page_is_stale() {
        let routes = Arc::new(Routes::default());
        let mut dash = dashboard(&routes);
        dash.state.query.next_page();
        dash.state.query.next_page();
        let page = ci_list::decode(json!({"items": [{"id": "ci-41"}], "total": 100}), 40).unwrap();
        dash.state.panels.ci_list = PanelState::Ready(page);

        dash.state.query.reset();
        assert!(dash.begin(Command::NextPage).is_empty());
        assert_eq!(dash.state().query.offset(), 0);
    }
}
