//! View model → terminal text.
//!
//! Everything here works on projections from [`crate::panels`]; nothing
//! reads the network or mutates state. Output is built into a `String` so it
//! can be asserted on without a terminal.

use std::fmt::{self, Write};

use colored::Colorize;

use crate::panels::{
    PanelState, activity, alerts, ci_detail, ci_list, collisions, drift, graph, jobs, picker,
    relationships, summary,
};
use crate::state::scope::{Control, ControlState, READ_ONLY, RowAffordance, gate};
use crate::state::{DashboardState, StatusLevel, StatusLine};
use crate::utils::{format_number, pad, truncate};

/// Controls that are not tied to a row.
const GLOBAL_CONTROLS: [Control; 5] = [
    Control::CreateRelationship,
    Control::NetboxImport,
    Control::BackstageSync,
    Control::TriggerSchedule,
    Control::RunLifecycle,
];

/// Full dashboard, top to bottom.
pub fn render_dashboard(state: &DashboardState) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dashboard(&mut out, state);
    out
}

/// Just the status line, for shell commands that do not redraw.
pub fn render_status(status: &StatusLine) -> String {
    let mut out = String::new();
    let _ = write_status(&mut out, status);
    out
}

pub fn render_picker(state: &DashboardState) -> String {
    let mut out = String::new();
    let _ = write_picker(&mut out, state);
    out
}

fn write_dashboard(out: &mut String, state: &DashboardState) -> fmt::Result {
    write_header(out, state)?;
    write_status(out, &state.status)?;
    write_summary(out, state)?;
    write_alerts(out, state)?;
    write_ci_list(out, state)?;
    write_selection(out, state)?;
    write_collisions(out, state)?;
    write_jobs(out, state)?;
    write_activity(out, state)
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", title.bold().cyan())
}

fn empty(out: &mut String, what: &str) -> fmt::Result {
    writeln!(out, "  {}", format!("no {what}").dimmed())
}

// ---------------------------------------------------------------------------
// Header, controls, status
// ---------------------------------------------------------------------------

fn write_header(out: &mut String, state: &DashboardState) -> fmt::Result {
    writeln!(out, "{}", "CMDB Operator Dashboard".bold().cyan())?;
    let who = state.principal.as_deref().unwrap_or("unknown principal");
    writeln!(out, "  {} {} ({})", "Signed in:".bold(), who, state.scope)?;

    let controls: Vec<String> = GLOBAL_CONTROLS
        .iter()
        .map(|&c| control_marker(c.label(), gate(state.scope, c)))
        .collect();
    writeln!(out, "  {} {}", "Controls: ".bold(), controls.join(" "))
}

fn control_marker(label: &str, control: ControlState) -> String {
    match control {
        ControlState::Enabled => format!("[{label}]").green().to_string(),
        ControlState::Disabled { reason } => format!("{label} ({reason})").dimmed().to_string(),
    }
}

fn affordance_marker(affordance: &RowAffordance) -> String {
    match affordance {
        RowAffordance::Action { label, .. } => format!("[{label}]").green().to_string(),
        RowAffordance::ReadOnly => READ_ONLY.dimmed().to_string(),
    }
}

fn write_status(out: &mut String, status: &StatusLine) -> fmt::Result {
    if status.message.is_empty() {
        return Ok(());
    }
    let line = match status.level {
        StatusLevel::Info => status.message.normal(),
        StatusLevel::Success => status.message.green(),
        StatusLevel::Error => status.message.red(),
    };
    writeln!(out, "{} {line}", "▸".bold())?;
    if let Some(detail) = &status.detail {
        writeln!(out, "  {}", detail.dimmed())?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Independent panels
// ---------------------------------------------------------------------------

fn write_summary(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Summary")?;
    let PanelState::Ready(data) = &state.panels.summary else {
        return empty(out, "summary");
    };
    let view = summary::project(data, &state.context());
    for (label, value) in &view.kpis {
        writeln!(out, "  {} {}", pad(label, 28).bold(), format_number(*value))?;
    }
    writeln!(out, "  {} {}", pad("sync", 28).bold(), view.sync_line)?;
    if let Some(job) = &view.latest_job {
        writeln!(out, "  {} {}", pad("latest job", 28).bold(), job)?;
    }
    let buckets = |rows: &[(String, u64)]| {
        rows.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    if !view.by_status.is_empty() {
        writeln!(out, "  {} {}", pad("by status", 28).bold(), buckets(&view.by_status))?;
    }
    if !view.by_source.is_empty() {
        writeln!(out, "  {} {}", pad("by source", 28).bold(), buckets(&view.by_source))?;
    }
    if !view.top_owners.is_empty() {
        writeln!(out, "  {} {}", pad("top owners", 28).bold(), buckets(&view.top_owners))?;
    }
    writeln!(out, "  {} {}", pad("schedules", 28).bold(), view.schedule_count)
}

fn write_alerts(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Alerts")?;
    let PanelState::Ready(data) = &state.panels.alerts else {
        return empty(out, "alert data");
    };
    let view = alerts::project(data, &state.context());
    writeln!(out, "  {}", view.headline)?;
    for row in &view.rows {
        let marker = if row.active { "●".red() } else { "○".dimmed() };
        writeln!(out, "  {marker} {} {} ({})", pad(&row.severity, 9), row.message, row.progress)?;
    }
    Ok(())
}

fn write_ci_list(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Configuration Items")?;
    let PanelState::Ready(page) = &state.panels.ci_list else {
        return empty(out, "CI list loaded");
    };
    let view = ci_list::project(page, &state.context());
    if !view.filters.is_empty() {
        writeln!(out, "  {} {}", "Filters:".dimmed(), view.filters.join(" "))?;
    }
    if view.rows.is_empty() {
        empty(out, "CIs match the current filters")?;
    }
    for row in &view.rows {
        let cursor = if row.selected { "▶".yellow().bold() } else { " ".normal() };
        writeln!(
            out,
            " {cursor} {} {} {} {} {} {}",
            pad(&row.id, 14).dimmed(),
            pad(&row.name, 28),
            pad(&row.ci_type, 12),
            pad(&row.status, 10),
            pad(&row.owner, 14),
            row.environment
        )?;
    }
    let prev = if view.prev_enabled { "[prev]".normal() } else { "prev".dimmed() };
    let next = if view.next_enabled { "[next]".normal() } else { "next".dimmed() };
    writeln!(out, "  {prev} {} {next}", view.range_label)
}

fn write_collisions(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Collisions")?;
    let PanelState::Ready(data) = &state.panels.collisions else {
        return empty(out, "collision data");
    };
    let rows = collisions::project(data, &state.context());
    if rows.is_empty() {
        return empty(out, "collisions");
    }
    for row in &rows {
        writeln!(
            out,
            "  {} {} {} vs {} {} {}",
            pad(&row.id, 6).dimmed(),
            pad(&row.key, 30),
            row.existing,
            row.incoming,
            pad(&row.status, 9),
            affordance_marker(&row.affordance)
        )?;
        if let Some(note) = &row.note {
            writeln!(out, "         {}", note.dimmed())?;
        }
    }
    Ok(())
}

fn write_jobs(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Integration Jobs")?;
    let PanelState::Ready(data) = &state.panels.jobs else {
        return empty(out, "job data");
    };
    let rows = jobs::project(data, &state.context());
    if rows.is_empty() {
        return empty(out, "jobs");
    }
    for row in &rows {
        let status = if row.is_failed() {
            row.status.red()
        } else {
            row.status.normal()
        };
        write!(
            out,
            "  {} {} {} {} {}",
            pad(&row.id, 10).dimmed(),
            pad(&row.job_type, 16),
            status,
            row.attempts,
            row.created_at.dimmed()
        )?;
        match &row.error {
            Some(err) => writeln!(out, " {}", truncate(err, 60).red()),
            None => writeln!(out),
        }?;
    }
    Ok(())
}

fn write_activity(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Recent Activity")?;
    let PanelState::Ready(data) = &state.panels.activity else {
        return empty(out, "activity data");
    };
    let rows = activity::project(data, &state.context());
    if rows.is_empty() {
        return empty(out, "recent activity");
    }
    for row in &rows {
        writeln!(
            out,
            "  {} {} {}",
            pad(&row.at, 26).dimmed(),
            pad(&row.event_type, 24),
            row.subject
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection-scoped panels
// ---------------------------------------------------------------------------

fn write_selection(out: &mut String, state: &DashboardState) -> fmt::Result {
    let ctx = state.context();
    let Some(selected) = ctx.selected else {
        section(out, "Selected CI")?;
        return empty(out, "CI selected");
    };
    section(out, &format!("Selected CI: {}", state.names.label(selected)))?;

    match &state.panels.detail {
        PanelState::Ready(detail) => {
            let view = ci_detail::project(detail, &ctx);
            writeln!(out, "  {}", view.title.bold())?;
            for (k, v) in &view.fields {
                writeln!(out, "  {} {v}", pad(k, 14).dimmed())?;
            }
            for (k, v) in &view.attributes {
                writeln!(out, "  {} {v}", pad(&format!("· {k}"), 14).dimmed())?;
            }
            if !view.identities.is_empty() {
                writeln!(out, "  {} {}", pad("identities", 14).dimmed(), view.identities.join(", "))?;
            }
            writeln!(out, "  {}", view.neighbours.dimmed())?;
        }
        PanelState::Empty => empty(out, "detail")?,
    }

    writeln!(out, "  {}", "Drift".bold())?;
    match &state.panels.drift {
        PanelState::Ready(report) => {
            let view = drift::project(report, &ctx);
            writeln!(out, "    overall: {}", view.overall)?;
            for source in &view.sources {
                let reason = source
                    .reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                let resolve = source
                    .resolve
                    .map(|c| format!(" {}", control_marker("resolve", c)))
                    .unwrap_or_default();
                writeln!(out, "    {} {}{reason}{resolve}", pad(source.source, 10), source.status)?;
                for m in &source.mismatches {
                    writeln!(out, "      {}: {} → {}", m.field, m.cmdb, m.target)?;
                }
            }
        }
        PanelState::Empty => writeln!(out, "    {}", "no drift report".dimmed())?,
    }

    writeln!(out, "  {}", "Graph".bold())?;
    match &state.panels.graph {
        PanelState::Ready(data) => {
            let view = graph::project(data, &ctx);
            if view.upstream.is_empty() && view.downstream.is_empty() {
                writeln!(out, "    {}", "no neighbours".dimmed())?;
            }
            for line in &view.upstream {
                writeln!(out, "    ↑ {line}")?;
            }
            for line in &view.downstream {
                writeln!(out, "    ↓ {line}")?;
            }
        }
        PanelState::Empty => writeln!(out, "    {}", "no graph".dimmed())?,
    }

    writeln!(out, "  {}", "Relationships".bold())?;
    match &state.panels.relationships {
        PanelState::Ready(data) => {
            let rows = relationships::project(data, &ctx);
            if rows.is_empty() {
                writeln!(out, "    {}", "no relationships".dimmed())?;
            }
            for row in &rows {
                writeln!(
                    out,
                    "    {} {} --{}--> {} {} {}",
                    pad(&row.id, 6).dimmed(),
                    row.from,
                    row.relation_type,
                    row.to,
                    format!("({})", row.source).dimmed(),
                    affordance_marker(&row.affordance)
                )?;
            }
        }
        PanelState::Empty => writeln!(out, "    {}", "no relationships loaded".dimmed())?,
    }
    Ok(())
}

fn write_picker(out: &mut String, state: &DashboardState) -> fmt::Result {
    section(out, "Picker")?;
    let PanelState::Ready(entries) = &state.panels.picker else {
        return empty(out, "picker results");
    };
    let lines = picker::project(entries, &state.context());
    if lines.is_empty() {
        return empty(out, "matches");
    }
    for (selected, line) in lines {
        let cursor = if selected { "▶".yellow().bold() } else { " ".normal() };
        writeln!(out, " {cursor} {line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::panels::relationships::RelationshipRecord;
    use crate::state::scope::{OPERATOR_REQUIRED, ScopeTier};

    fn with_rows(scope: ScopeTier) -> DashboardState {
        let mut state = DashboardState::default();
        state.scope = scope;
        state.selection.select("ci-1");
        state.panels.relationships = PanelState::Ready(vec![RelationshipRecord {
            id: "11".to_string(),
            source_ci_id: "ci-1".to_string(),
            target_ci_id: "ci-2".to_string(),
            relation_type: "depends_on".to_string(),
            source: "manual".to_string(),
            created_at: String::new(),
        }]);
        state.panels.collisions = PanelState::Ready(
            collisions::decode(json!([{"id": 7, "scheme": "serial", "value": "SN-1", "status": "OPEN"}]))
                .unwrap(),
        );
        state
    }

    #[test]
    fn viewer_sees_read_only_markers_and_reasons() {
        let out = render_dashboard(&with_rows(ScopeTier::Viewer));
        assert!(out.contains(READ_ONLY));
        assert!(!out.contains("[delete]"));
        assert!(!out.contains("[resolve]"));
        assert!(out.contains(&format!("run lifecycle ({OPERATOR_REQUIRED})")));
    }

    #[test]
    fn operator_sees_action_markers() {
        let out = render_dashboard(&with_rows(ScopeTier::Operator));
        assert!(out.contains("[delete]"));
        assert!(out.contains("[resolve]"));
        assert!(out.contains("[run lifecycle]"));
        assert!(!out.contains(OPERATOR_REQUIRED));
    }

    #[test]
    fn empty_state_renders_placeholders() {
        let out = render_dashboard(&DashboardState::default());
        assert!(out.contains("no CI selected"));
        assert!(out.contains("no CI list loaded"));
    }

    #[test]
    fn status_detail_is_shown() {
        let mut status = StatusLine::default();
        status.success("Lifecycle run completed", Some("{\"transitioned\":3}".to_string()));
        let out = render_status(&status);
        assert!(out.contains("Lifecycle run completed"));
        assert!(out.contains("transitioned"));
    }

    #[test]
    fn long_status_detail_is_printed_whole() {
        let detail = format!("{{\"ids\":\"{}\"}}", "x".repeat(1000));
        let mut status = StatusLine::default();
        status.success("NetBox import completed", Some(detail.clone()));
        assert!(render_status(&status).contains(&detail));
    }
}
