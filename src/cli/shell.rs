//! Interactive shell: one dashboard kept alive across many commands.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::api::endpoints::SyncFlags;
use crate::dispatch::{Action, Command, Dashboard, ExportKind};
use crate::render;
use crate::state::DashboardState;
use crate::state::query::FilterFields;

pub const HELP: &str = "\
Commands:
  refresh                                  reload every panel
  show                                     redraw the dashboard
  filter k=v ... [keep-offset]             q, source, status, owner, env, class, limit
  reset                                    restore default filters
  next | prev                              page through the CI list
  select ID                                focus a CI
  pick [TERM]                              search the CI picker
  rel add SRC TGT TYPE [SOURCE]            create a relationship
  rel rm ID                                delete a relationship
  collision resolve|reopen ID [NOTE...]    change a collision
  drift resolve SOURCE F1,F2               accept source values for the selected CI
  sync netbox|backstage [async] [incremental] [dry-run] [limit=N]
  schedule NAME                            trigger a sync schedule
  lifecycle                                run lifecycle transitions
  export audit|netbox [PATH]               download an export
  help | quit";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    Run(Command),
    Show,
    Help,
    Quit,
    Empty,
}

/// Parse a line against the current state (filters are edited in place,
/// drift resolution targets the selected CI).
pub fn parse_line(line: &str, state: &DashboardState) -> Result<ShellInput, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Ok(ShellInput::Empty);
    };

    let command = match (head, rest) {
        ("quit" | "exit" | "q", _) => return Ok(ShellInput::Quit),
        ("help" | "?", _) => return Ok(ShellInput::Help),
        ("show", _) => return Ok(ShellInput::Show),
        ("refresh", []) => Command::Refresh,
        ("reset", []) => Command::ResetFilters,
        ("next", []) => Command::NextPage,
        ("prev", []) => Command::PrevPage,
        ("select", [id]) => Command::Select(id.to_string()),
        ("pick", terms) => Command::Pick(terms.join(" ")),
        ("filter", args) => parse_filter(args, state.query.fields())?,
        ("rel", ["add", src, tgt, kind, source @ ..]) if source.len() <= 1 => {
            Command::Run(Action::CreateRelationship {
                source_ci_id: src.to_string(),
                target_ci_id: tgt.to_string(),
                relation_type: kind.to_string(),
                source: source.first().map(|s| s.to_string()).unwrap_or_default(),
            })
        }
        ("rel", ["rm", id]) => Command::Run(Action::DeleteRelationship { id: id.to_string() }),
        ("collision", ["resolve", id, note @ ..]) => Command::Run(Action::ResolveCollision {
            id: id.to_string(),
            note: note.join(" "),
        }),
        ("collision", ["reopen", id, note @ ..]) => Command::Run(Action::ReopenCollision {
            id: id.to_string(),
            note: note.join(" "),
        }),
        ("drift", ["resolve", source, fields @ ..]) => Command::Run(Action::ResolveDrift {
            ci_id: state.selection.selected().unwrap_or_default().to_string(),
            source: source.to_string(),
            fields: split_fields(&fields.join(",")),
        }),
        ("sync", [target, flags @ ..]) => {
            let flags = parse_sync_flags(flags)?;
            match *target {
                "netbox" => Command::Run(Action::NetboxImport(flags)),
                "backstage" => Command::Run(Action::BackstageSync(flags)),
                other => return Err(format!("unknown sync target: {other}")),
            }
        }
        ("schedule", [name]) => Command::Run(Action::TriggerSchedule {
            name: name.to_string(),
        }),
        ("lifecycle", []) => Command::Run(Action::RunLifecycle),
        ("export", [kind, path @ ..]) if path.len() <= 1 => {
            let kind = match *kind {
                "audit" => ExportKind::Audit,
                "netbox" => ExportKind::Netbox,
                other => return Err(format!("unknown export: {other}")),
            };
            Command::Export {
                kind,
                path: path.first().map(PathBuf::from),
            }
        }
        _ => return Err(format!("cannot parse '{}', try `help`", line.trim())),
    };
    Ok(ShellInput::Run(command))
}

/// Split `a,b, c` into trimmed, non-empty field names.
pub fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_filter(args: &[&str], mut fields: FilterFields) -> Result<Command, String> {
    let mut reset_offset = true;
    for arg in args {
        if *arg == "keep-offset" {
            reset_offset = false;
            continue;
        }
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{arg}'"))?;
        match key {
            "q" | "text" => fields.text = value.to_string(),
            "source" => fields.source = value.to_string(),
            "status" => fields.status = value.to_string(),
            "owner" => fields.owner = value.to_string(),
            "env" | "environment" => fields.environment = value.to_string(),
            "class" | "ci_class" => fields.ci_class = value.to_string(),
            "limit" => {
                let limit: u32 = value
                    .parse()
                    .map_err(|_| format!("limit must be a positive number, got '{value}'"))?;
                if limit == 0 {
                    return Err("limit must be greater than zero".to_string());
                }
                fields.limit = Some(limit);
            }
            other => return Err(format!("unknown filter: {other}")),
        }
    }
    Ok(Command::ApplyFilters {
        fields,
        reset_offset,
    })
}

fn parse_sync_flags(args: &[&str]) -> Result<SyncFlags, String> {
    let mut flags = SyncFlags::default();
    for arg in args {
        match *arg {
            "async" => flags.async_job = true,
            "incremental" => flags.incremental = true,
            "dry-run" => flags.dry_run = true,
            other => {
                let limit = other
                    .strip_prefix("limit=")
                    .and_then(|v| v.parse::<u32>().ok())
                    .ok_or_else(|| format!("unknown sync flag: {other}"))?;
                flags.limit = Some(limit);
            }
        }
    }
    Ok(flags)
}

/// Read commands from stdin until `quit` or EOF. Saves the snapshot after
/// every command through `save`.
pub fn run(dashboard: &mut Dashboard, save: &dyn Fn(&DashboardState)) -> Result<()> {
    dashboard.execute(Command::Refresh);
    print!("{}", render::render_dashboard(dashboard.state()));
    println!("{}", "Type `help` for commands.".dimmed());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "cmdb>".bold().cyan());
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match parse_line(&line, dashboard.state()) {
            Ok(ShellInput::Quit) => break,
            Ok(ShellInput::Empty) => {}
            Ok(ShellInput::Help) => println!("{HELP}"),
            Ok(ShellInput::Show) => print!("{}", render::render_dashboard(dashboard.state())),
            Ok(ShellInput::Run(Command::Pick(term))) => {
                dashboard.execute(Command::Pick(term));
                print!("{}", render::render_status(&dashboard.state().status));
                print!("{}", render::render_picker(dashboard.state()));
            }
            Ok(ShellInput::Run(command)) => {
                dashboard.execute(command);
                print!("{}", render::render_dashboard(dashboard.state()));
                save(dashboard.state());
            }
            Err(message) => println!("{}", message.red()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ShellInput {
        parse_line(line, &DashboardState::default()).unwrap()
    }

    #[test]
    fn filter_edits_current_fields() {
        let mut state = DashboardState::default();
        state.query.owner = "platform".to_string();
        let input = parse_line("filter status=RETIRED env=prod", &state).unwrap();
        let ShellInput::Run(Command::ApplyFilters {
            fields,
            reset_offset,
        }) = input
        else {
            panic!("unexpected {input:?}");
        };
        assert!(reset_offset);
        assert_eq!(fields.status, "RETIRED");
        assert_eq!(fields.environment, "prod");
        assert_eq!(fields.owner, "platform");
    }

    #[test]
    fn filter_keep_offset_and_bad_input() {
        let state = DashboardState::default();
        assert!(matches!(
            parse_line("filter keep-offset", &state),
            Ok(ShellInput::Run(Command::ApplyFilters { reset_offset: false, .. }))
        ));
        assert!(parse_line("filter colour=red", &state).is_err());
        assert!(parse_line("filter limit=0", &state).is_err());
        assert!(parse_line("filter status", &state).is_err());
    }

    #[test]
    fn relationship_commands() {
        assert_eq!(
            parse("rel add ci-1 ci-2 depends_on"),
            ShellInput::Run(Command::Run(Action::CreateRelationship {
                source_ci_id: "ci-1".to_string(),
                target_ci_id: "ci-2".to_string(),
                relation_type: "depends_on".to_string(),
                source: String::new(),
            }))
        );
        assert_eq!(
            parse("rel rm 11"),
            ShellInput::Run(Command::Run(Action::DeleteRelationship {
                id: "11".to_string()
            }))
        );
    }

    #[test]
    fn collision_note_is_rest_of_line() {
        assert_eq!(
            parse("collision resolve 7 same host, merged"),
            ShellInput::Run(Command::Run(Action::ResolveCollision {
                id: "7".to_string(),
                note: "same host, merged".to_string(),
            }))
        );
    }

    #[test]
    fn drift_targets_selected_ci() {
        let mut state = DashboardState::default();
        state.selection.select("ci-42");
        let input = parse_line("drift resolve netbox name, owner", &state).unwrap();
        assert_eq!(
            input,
            ShellInput::Run(Command::Run(Action::ResolveDrift {
                ci_id: "ci-42".to_string(),
                source: "netbox".to_string(),
                fields: vec!["name".to_string(), "owner".to_string()],
            }))
        );
    }

    #[test]
    fn sync_flags() {
        assert_eq!(
            parse("sync backstage async dry-run limit=5"),
            ShellInput::Run(Command::Run(Action::BackstageSync(SyncFlags {
                async_job: true,
                incremental: false,
                dry_run: true,
                limit: Some(5),
            })))
        );
        assert!(parse_line("sync jira", &DashboardState::default()).is_err());
        assert!(parse_line("sync netbox fast", &DashboardState::default()).is_err());
    }

    #[test]
    fn misc_commands() {
        assert_eq!(parse(""), ShellInput::Empty);
        assert_eq!(parse("quit"), ShellInput::Quit);
        assert_eq!(parse("next"), ShellInput::Run(Command::NextPage));
        assert_eq!(parse("pick db prod"), ShellInput::Run(Command::Pick("db prod".to_string())));
        assert_eq!(
            parse("export netbox out.json"),
            ShellInput::Run(Command::Export {
                kind: ExportKind::Netbox,
                path: Some(PathBuf::from("out.json")),
            })
        );
        assert!(parse_line("select", &DashboardState::default()).is_err());
    }
}
