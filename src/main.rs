use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use cmdbdash::api::endpoints::SyncFlags;
use cmdbdash::cli;
use cmdbdash::config;
use cmdbdash::dispatch::{Action, Command, ExportKind};

#[derive(Debug, Parser)]
#[command(name = "cmdbdash")]
#[command(about = "Operator dashboard for the CMDB service")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load every panel and print the dashboard
    Show,
    /// Apply CI list filters on top of the saved query
    List {
        /// Free-text search
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long = "env")]
        environment: Option<String>,
        #[arg(long = "class")]
        ci_class: Option<String>,
        /// Page size
        #[arg(long)]
        limit: Option<u32>,
        /// Keep the current page offset instead of returning to the first page
        #[arg(long)]
        keep_offset: bool,
    },
    /// Next page of the CI list
    Next,
    /// Previous page of the CI list
    Prev,
    /// Focus a CI and load its detail, drift, graph and relationships
    Select { id: String },
    /// Search the CI picker
    Pick {
        #[arg(trailing_var_arg = true)]
        term: Vec<String>,
    },
    /// Create or delete relationships
    Relationship {
        #[command(subcommand)]
        command: RelationshipCommand,
    },
    /// Resolve or reopen identity collisions
    Collision {
        #[command(subcommand)]
        command: CollisionCommand,
    },
    /// Accept source values for drifted fields
    Drift {
        #[command(subcommand)]
        command: DriftCommand,
    },
    /// Trigger an integration sync
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },
    /// Sync schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
    /// Lifecycle transitions
    Lifecycle {
        #[command(subcommand)]
        command: LifecycleCommand,
    },
    /// Download an export to a file
    Export {
        #[command(subcommand)]
        command: ExportCommand,
    },
    /// Manage the API token
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },
    /// Show recent action journal entries
    Journal {
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long, value_enum, default_value = "table")]
        format: cli::OutputFormat,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Interactive session
    Shell,
}

#[derive(Debug, Subcommand)]
enum RelationshipCommand {
    Create {
        source_ci_id: String,
        target_ci_id: String,
        relation_type: String,
        /// Provenance recorded on the relationship (default: manual)
        #[arg(long, default_value = "")]
        source: String,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum CollisionCommand {
    Resolve {
        id: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    Reopen {
        id: String,
        #[arg(long, default_value = "")]
        note: String,
    },
}

#[derive(Debug, Subcommand)]
enum DriftCommand {
    Resolve {
        ci_id: String,
        /// netbox or backstage
        source: String,
        /// Comma-separated field names
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Queue as a background job
    #[arg(long = "async")]
    async_job: bool,
    #[arg(long)]
    incremental: bool,
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    limit: Option<u32>,
}

impl From<SyncArgs> for SyncFlags {
    fn from(args: SyncArgs) -> Self {
        Self {
            async_job: args.async_job,
            incremental: args.incremental,
            dry_run: args.dry_run,
            limit: args.limit,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SyncCommand {
    Netbox(SyncArgs),
    Backstage(SyncArgs),
}

#[derive(Debug, Subcommand)]
enum ScheduleCommand {
    Trigger { name: String },
}

#[derive(Debug, Subcommand)]
enum LifecycleCommand {
    Run,
}

#[derive(Debug, Subcommand)]
enum ExportCommand {
    Audit { path: Option<PathBuf> },
    Netbox { path: Option<PathBuf> },
}

#[derive(Debug, Subcommand)]
enum TokenCommand {
    Set { token: String },
    Show,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Show the effective (merged) configuration
    Show,
    /// Write a default config file to ~/.cmdbdash/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a configuration value (dotted key, e.g. api.base_url)
    Set { key: String, value: String },
    /// Reset configuration to defaults
    Reset,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let app = App::parse();
    init_tracing(&config::load().logging.level);

    match app.command {
        Commands::Show => cli::run_oneshot(None),
        Commands::List {
            q,
            source,
            status,
            owner,
            environment,
            ci_class,
            limit,
            keep_offset,
        } => cli::run_list(
            cli::FilterOverrides {
                text: q,
                source,
                status,
                owner,
                environment,
                ci_class,
                limit,
            },
            keep_offset,
        ),
        Commands::Next => cli::run_oneshot(Some(Command::NextPage)),
        Commands::Prev => cli::run_oneshot(Some(Command::PrevPage)),
        Commands::Select { id } => cli::run_oneshot(Some(Command::Select(id))),
        Commands::Pick { term } => cli::run_pick(&term.join(" ")),
        Commands::Relationship { command } => {
            let action = match command {
                RelationshipCommand::Create {
                    source_ci_id,
                    target_ci_id,
                    relation_type,
                    source,
                } => Action::CreateRelationship {
                    source_ci_id,
                    target_ci_id,
                    relation_type,
                    source,
                },
                RelationshipCommand::Delete { id } => Action::DeleteRelationship { id },
            };
            cli::run_oneshot(Some(Command::Run(action)))
        }
        Commands::Collision { command } => {
            let action = match command {
                CollisionCommand::Resolve { id, note } => Action::ResolveCollision { id, note },
                CollisionCommand::Reopen { id, note } => Action::ReopenCollision { id, note },
            };
            cli::run_oneshot(Some(Command::Run(action)))
        }
        Commands::Drift {
            command:
                DriftCommand::Resolve {
                    ci_id,
                    source,
                    fields,
                },
        } => cli::run_oneshot(Some(Command::Run(Action::ResolveDrift {
            ci_id,
            source,
            fields,
        }))),
        Commands::Sync { command } => {
            let action = match command {
                SyncCommand::Netbox(args) => Action::NetboxImport(args.into()),
                SyncCommand::Backstage(args) => Action::BackstageSync(args.into()),
            };
            cli::run_oneshot(Some(Command::Run(action)))
        }
        Commands::Schedule {
            command: ScheduleCommand::Trigger { name },
        } => cli::run_oneshot(Some(Command::Run(Action::TriggerSchedule { name }))),
        Commands::Lifecycle {
            command: LifecycleCommand::Run,
        } => cli::run_oneshot(Some(Command::Run(Action::RunLifecycle))),
        Commands::Export { command } => {
            let (kind, path) = match command {
                ExportCommand::Audit { path } => (ExportKind::Audit, path),
                ExportCommand::Netbox { path } => (ExportKind::Netbox, path),
            };
            cli::run_oneshot(Some(Command::Export { kind, path }))
        }
        Commands::Token { command } => match command {
            TokenCommand::Set { token } => cli::run_token_set(&token),
            TokenCommand::Show => cli::run_token_show(),
        },
        Commands::Journal { limit, format } => cli::run_journal(limit, format),
        Commands::Config { command } => match command {
            ConfigCommand::Show => cli::run_config_show(),
            ConfigCommand::Init { force } => cli::run_config_init(force),
            ConfigCommand::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigCommand::Reset => cli::run_config_reset(),
        },
        Commands::Shell => cli::run_shell(),
    }
}
