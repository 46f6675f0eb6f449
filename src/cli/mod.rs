//! CLI command implementations for cmdbdash.
//!
//! Provides subcommand handlers for:
//! - one-shot dashboard commands (`show`, `list`, `select`, actions, exports)
//! - `cmdbdash shell` — interactive session over one dashboard
//! - `cmdbdash token set|show` — credential management
//! - `cmdbdash journal` — recent action journal entries
//! - `cmdbdash config show|init|set|reset` — configuration management

pub mod shell;

use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;

use crate::api::{ApiClient, UreqTransport};
use crate::config::{self, schema::DashConfig};
use crate::dispatch::{Command, Dashboard};
use crate::journal::{Journal, JournalEntry, Outcome};
use crate::render;
use crate::session::{self, FileSessionStore, SessionStore};
use crate::state::{DashboardState, UiSnapshot};
use crate::utils::{pad, truncate};

/// How `cmdbdash journal` prints entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// CI-list filter values given on the command line. `None` keeps the value
/// from the saved query.
#[derive(Debug, Clone, Default)]
pub struct FilterOverrides {
    pub text: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub environment: Option<String>,
    pub ci_class: Option<String>,
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Dashboard construction
// ---------------------------------------------------------------------------

fn journal_for(config: &DashConfig) -> Journal {
    if config.logging.enabled {
        Journal::new(config.logging.resolved_path())
    } else {
        Journal::disabled()
    }
}

/// Build a dashboard from configuration, restoring the saved UI snapshot.
pub fn open_dashboard(config: &DashConfig) -> Result<Dashboard> {
    let session: Arc<dyn SessionStore> =
        Arc::new(FileSessionStore::new(config.session.resolved_path()));
    let transport = UreqTransport::new(config.api.timeout_ms);
    let client = ApiClient::new(&config.api.base_url, session, Box::new(transport))?;
    let state = DashboardState::from_snapshot(UiSnapshot::load(
        &config.dashboard.resolved_state_path(),
    ));
    Ok(Dashboard::new(
        client,
        config.dashboard.clone(),
        journal_for(config),
        state,
    ))
}

fn save_snapshot(config: &DashConfig, state: &DashboardState) {
    let path = config.dashboard.resolved_state_path();
    if let Err(e) = state.snapshot().save(&path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to save ui state");
    }
}

// ---------------------------------------------------------------------------
// One-shot commands
// ---------------------------------------------------------------------------

/// Page load, then `command` (if any), then render and persist.
pub fn run_oneshot(command: Option<Command>) -> Result<()> {
    let config = config::load();
    let mut dashboard = open_dashboard(&config)?;
    dashboard.execute(Command::Refresh);
    if let Some(command) = command {
        dashboard.execute(command);
    }
    print!("{}", render::render_dashboard(dashboard.state()));
    save_snapshot(&config, dashboard.state());
    Ok(())
}

/// Page load, then apply filters on top of the saved query.
pub fn run_list(overrides: FilterOverrides, keep_offset: bool) -> Result<()> {
    let config = config::load();
    let mut dashboard = open_dashboard(&config)?;
    dashboard.execute(Command::Refresh);

    let mut fields = dashboard.state().query.fields();
    let FilterOverrides {
        text,
        source,
        status,
        owner,
        environment,
        ci_class,
        limit,
    } = overrides;
    if let Some(v) = text {
        fields.text = v;
    }
    if let Some(v) = source {
        fields.source = v;
    }
    if let Some(v) = status {
        fields.status = v;
    }
    if let Some(v) = owner {
        fields.owner = v;
    }
    if let Some(v) = environment {
        fields.environment = v;
    }
    if let Some(v) = ci_class {
        fields.ci_class = v;
    }
    if limit.is_some() {
        fields.limit = limit;
    }

    dashboard.execute(Command::ApplyFilters {
        fields,
        reset_offset: !keep_offset,
    });
    print!("{}", render::render_dashboard(dashboard.state()));
    save_snapshot(&config, dashboard.state());
    Ok(())
}

/// Search the entity picker and print the matches.
pub fn run_pick(term: &str) -> Result<()> {
    let config = config::load();
    let mut dashboard = open_dashboard(&config)?;
    dashboard.execute(Command::Refresh);
    dashboard.execute(Command::Pick(term.to_string()));
    print!("{}", render::render_status(&dashboard.state().status));
    print!("{}", render::render_picker(dashboard.state()));
    Ok(())
}

/// Interactive session over one dashboard.
pub fn run_shell() -> Result<()> {
    let config = config::load();
    let mut dashboard = open_dashboard(&config)?;
    let save = |state: &DashboardState| save_snapshot(&config, state);
    shell::run(&mut dashboard, &save)?;
    save_snapshot(&config, dashboard.state());
    Ok(())
}

// ---------------------------------------------------------------------------
// cmdbdash token set | show
// ---------------------------------------------------------------------------

pub fn run_token_set(token: &str) -> Result<()> {
    let config = config::load();
    let store = FileSessionStore::new(config.session.resolved_path());
    store.set_token(token)?;
    if token.trim().is_empty() {
        println!("{} Token cleared", "✓".green().bold());
    } else {
        println!(
            "{} Token saved to {}",
            "✓".green().bold(),
            store.path().display()
        );
    }
    Ok(())
}

pub fn run_token_show() -> Result<()> {
    let config = config::load();
    let store = FileSessionStore::new(config.session.resolved_path());
    match store.token() {
        Some(token) => println!("{} {}", "Token:".bold(), session::mask(&token)),
        None => println!(
            "{}",
            "No token set. Run `cmdbdash token set <TOKEN>` first.".yellow()
        ),
    }
    println!("  {}", store.path().display().to_string().dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// cmdbdash journal
// ---------------------------------------------------------------------------

/// Show the most recent action journal entries.
pub fn run_journal(limit: usize, format: OutputFormat) -> Result<()> {
    let config = config::load();
    // Read back even when recording is switched off.
    let entries = Journal::new(config.logging.resolved_path()).tail(limit);

    if entries.is_empty() {
        println!("{}", "No actions journaled yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Csv => print_journal_csv(&entries),
        OutputFormat::Table => print_journal_table(&entries),
    }
    Ok(())
}

fn print_journal_table(entries: &[JournalEntry]) {
    println!("{}", "Action Journal".bold().cyan());
    println!("{}", "=".repeat(80));
    for entry in entries {
        let label = pad(entry.outcome.as_str(), 7);
        let outcome = match entry.outcome {
            Outcome::Ok => label.green(),
            Outcome::Error => label.red(),
            Outcome::Blocked => label.yellow(),
        };
        let at = entry.timestamp.get(..19).unwrap_or(&entry.timestamp);
        println!(
            "  {}  {}  {}  {}",
            at.dimmed(),
            outcome,
            pad(&entry.action, 22).bold(),
            truncate(&entry.message, 60)
        );
        if !entry.target.is_empty() {
            println!("  {:<19}  {}", "", entry.target.dimmed());
        }
    }
}

fn print_journal_csv(entries: &[JournalEntry]) {
    println!("timestamp,action,target,outcome,message");
    for entry in entries {
        println!(
            "{},{},{},{},\"{}\"",
            entry.timestamp,
            entry.action,
            entry.target,
            entry.outcome.as_str(),
            entry.message.replace('"', "\"\"")
        );
    }
}

// ---------------------------------------------------------------------------
// cmdbdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Print the layer stack, then the merged result.
pub fn run_config_show() -> Result<()> {
    let merged = config::show_effective_config()?;

    println!("{}", "Config layers (later wins)".bold().cyan());
    for (name, path) in [
        ("global", config::global_config_file()),
        ("project", config::project_config_file()),
    ] {
        let Some(path) = path else {
            println!("  {} {name:<8} {}", "·".dimmed(), "no path available".dimmed());
            continue;
        };
        let marker = if path.exists() {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!("  {marker} {name:<8} {}", path.display().to_string().dimmed());
    }
    println!("  {} {:<8} {}", "·".dimmed(), "env", "CMDB_DASH_*".dimmed());
    println!();
    println!("{}", "Merged".bold().cyan());
    println!("{merged}");
    Ok(())
}

/// Write the annotated default file to `~/.cmdbdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Wrote {}", "✓".green().bold(), path.display());
    println!(
        "  {}",
        "Next: set api.base_url, then `cmdbdash token set <TOKEN>`.".dimmed()
    );
    Ok(())
}

/// Change one dotted key in the global file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    let target = config::global_config_file()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!("{} {} → {}", "✓".green().bold(), key.bold(), value);
    println!("  {}", target.dimmed());
    Ok(())
}

/// Overwrite the global file with defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!("{} Restored defaults in {}", "✓".green().bold(), path.display());
    Ok(())
}
