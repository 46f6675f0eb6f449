/// Configuration schema and defaults for cmdbdash.
///
/// Sections: `[api]`, `[session]`, `[dashboard]` and `[logging]`. Every
/// field has a built-in default, so a config file only needs the values it
/// wants to change.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Maps directly to `~/.cmdbdash/config.toml` and `.cmdbdash.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the CMDB REST API. May carry a path prefix.
    pub base_url: String,
    /// Local request timeout. `0` leaves timing to the server.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding the bearer token. `~/` expands to the home dir.
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "~/.cmdbdash/session.json".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Page sizes of the independent panels and related knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub activity_limit: u32,
    pub jobs_limit: u32,
    pub relationships_limit: u32,
    /// Status filter for the collisions panel. Empty lists every status.
    pub collision_status: String,
    pub picker_limit: u32,
    pub export_limit: u32,
    /// Where the query and selection persist between runs.
    pub state_path: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            activity_limit: 25,
            jobs_limit: 20,
            relationships_limit: 100,
            collision_status: "OPEN".to_string(),
            picker_limit: 50,
            export_limit: 1000,
            state_path: "~/.cmdbdash/ui-state.json".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn resolved_state_path(&self) -> PathBuf {
        expand_home(&self.state_path)
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append every action attempt to the journal.
    pub enabled: bool,
    pub path: String,
    /// Diagnostic level on stderr when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.cmdbdash/action-log.jsonl".to_string(),
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

/// Expand a leading `~/` to the home directory. Other paths pass through.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Default config with comments, written by `cmdbdash config init`.
    pub fn default_toml() -> String {
        r#"# cmdbdash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CMDB_DASH_*)
#   2. Project config (.cmdbdash.toml in current directory)
#   3. User global config (~/.cmdbdash/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8000"   # CMDB_DASH_URL
timeout_ms = 0                       # 0 = no local timeout

[session]
path = "~/.cmdbdash/session.json"    # CMDB_DASH_SESSION_PATH

[dashboard]
activity_limit = 25
jobs_limit = 20
relationships_limit = 100
collision_status = "OPEN"            # empty = all statuses
picker_limit = 50
export_limit = 1000
state_path = "~/.cmdbdash/ui-state.json"

[logging]
enabled = true                       # CMDB_DASH_LOG
path = "~/.cmdbdash/action-log.jsonl"
level = "warn"                       # CMDB_DASH_LOG_LEVEL, overridden by RUST_LOG
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_matches_defaults() {
        let parsed: DashConfig = toml::from_str(&DashConfig::default_toml()).unwrap();
        assert_eq!(parsed, DashConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: DashConfig = toml::from_str(
            r#"
[dashboard]
jobs_limit = 5
"#,
        )
        .unwrap();
        assert_eq!(parsed.dashboard.jobs_limit, 5);
        assert_eq!(parsed.dashboard.activity_limit, 25);
        assert_eq!(parsed.api.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn expand_home_only_touches_tilde_prefix() {
        assert_eq!(expand_home("/tmp/x.json"), PathBuf::from("/tmp/x.json"));
        assert_eq!(expand_home("rel/x.json"), PathBuf::from("rel/x.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a/b"), home.join("a").join("b"));
        }
    }
}
