/// Configuration system for cmdbdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::DashConfig::default()`]
/// 2. **User global config** — `~/.cmdbdash/config.toml`
/// 3. **Project local config** — `.cmdbdash.toml` in the current working directory
/// 4. **Environment variables** — `CMDB_DASH_*` overrides (highest precedence)
///
/// Layers merge at the key level: a file that sets only `dashboard.jobs_limit`
/// leaves every other value from the layers below it in place.
///
/// # Usage
///
/// ```rust,ignore
/// use cmdbdash::config;
///
/// let cfg = config::load();
/// println!("talking to {}", cfg.api.base_url);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration: defaults → global TOML → project
/// TOML → env vars.
pub fn load() -> DashConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.into_iter().flatten());
    apply_env_overrides(&mut config, &|name| std::env::var(name).ok());
    config
}

/// Merge TOML files over the defaults, in order. Missing or malformed files
/// are skipped with a warning so a bad file never locks the operator out.
fn load_layers(paths: impl IntoIterator<Item = PathBuf>) -> DashConfig {
    let Ok(mut merged) = toml::Value::try_from(DashConfig::default()) else {
        return DashConfig::default();
    };

    for path in paths {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        match toml::from_str::<toml::Value>(&content) {
            Ok(layer) => merge_toml(&mut merged, layer),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file")
            }
        }
    }

    merged.try_into().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config has invalid values, using defaults");
        DashConfig::default()
    })
}

/// Deep-merge `overlay` into `base`: tables merge per key, everything else
/// is replaced.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.cmdbdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cmdbdash").join("config.toml"))
}

/// Path to the project local config: `.cmdbdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".cmdbdash.toml"))
}

pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides (highest precedence layer).
///
/// Supported variables:
/// - `CMDB_DASH_URL` — API base URL
/// - `CMDB_DASH_TIMEOUT_MS` — local request timeout, `0` for none
/// - `CMDB_DASH_SESSION_PATH` — session file
/// - `CMDB_DASH_LOG` — action journal on/off (`1`/`true`/`yes`/`on`)
/// - `CMDB_DASH_LOG_LEVEL` — stderr diagnostic level
fn apply_env_overrides(config: &mut DashConfig, var: &dyn Fn(&str) -> Option<String>) {
    if let Some(val) = var("CMDB_DASH_URL")
        && !val.trim().is_empty()
    {
        config.api.base_url = val.trim().to_string();
    }
    if let Some(val) = var("CMDB_DASH_TIMEOUT_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = var("CMDB_DASH_SESSION_PATH")
        && !val.trim().is_empty()
    {
        config.session.path = val.trim().to_string();
    }
    if let Some(val) = var("CMDB_DASH_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = var("CMDB_DASH_LOG_LEVEL")
        && !val.trim().is_empty()
    {
        config.logging.level = val.trim().to_string();
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.cmdbdash/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.cmdbdash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set one dotted key (e.g. `dashboard.jobs_limit`) in the global config
/// file, creating the file from defaults when it does not exist yet.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashConfig::default())
            .context("failed to serialize default config")?
    };
    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;

    // Keys absent from an older file still exist in the schema.
    let Ok(defaults) = toml::Value::try_from(DashConfig::default()) else {
        anyhow::bail!("failed to build default config tree");
    };
    let mut full = defaults;
    merge_toml(&mut full, root.clone());
    ensure_key_exists(&full, key)?;
    ensure_section(&mut root, &full, key);

    set_toml_value(&mut root, key, value)?;

    // Reject values that would no longer deserialize (e.g. text for a number).
    let mut check = full;
    set_toml_value(&mut check, key, value)?;
    let _: DashConfig = check
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

fn ensure_key_exists(full: &toml::Value, key: &str) -> Result<()> {
    let mut current = full;
    for part in key.split('.') {
        current = current
            .get(part)
            .with_context(|| format!("unknown config key: '{key}'"))?;
    }
    Ok(())
}

/// Copy the section holding `key` from `full` into `root` when `root` lacks it.
fn ensure_section(root: &mut toml::Value, full: &toml::Value, key: &str) {
    let Some((section, _)) = key.split_once('.') else {
        return;
    };
    if let (Some(table), Some(defaults)) = (root.as_table_mut(), full.get(section))
        && !table.contains_key(section)
    {
        table.insert(section.to_string(), defaults.clone());
    }
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse according to the type already stored under the key.
    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn layers_merge_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(&global, "[api]\nbase_url = \"http://cmdb:9000\"\n[dashboard]\njobs_limit = 5\n")
            .unwrap();
        fs::write(&project, "[dashboard]\nactivity_limit = 7\n").unwrap();

        let config = load_layers([global, project]);
        assert_eq!(config.api.base_url, "http://cmdb:9000");
        assert_eq!(config.dashboard.jobs_limit, 5);
        assert_eq!(config.dashboard.activity_limit, 7);
        assert_eq!(config.dashboard.collision_status, "OPEN");
    }

    #[test]
    fn malformed_and_missing_layers_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[api\nbase_url = ").unwrap();
        let config = load_layers([bad, dir.path().join("missing.toml")]);
        assert_eq!(config, DashConfig::default());
    }

    #[test]
    fn env_overrides_win() {
        let mut config = DashConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[
                ("CMDB_DASH_URL", " http://10.0.0.5:8000/api "),
                ("CMDB_DASH_TIMEOUT_MS", "2500"),
                ("CMDB_DASH_SESSION_PATH", "/tmp/s.json"),
                ("CMDB_DASH_LOG", "off"),
                ("CMDB_DASH_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(config.api.base_url, "http://10.0.0.5:8000/api");
        assert_eq!(config.api.timeout_ms, 2500);
        assert_eq!(config.session.path, "/tmp/s.json");
        assert!(!config.logging.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let mut config = DashConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[("CMDB_DASH_TIMEOUT_MS", "soon"), ("CMDB_DASH_URL", "  ")]),
        );
        assert_eq!(config, DashConfig::default());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", " On "] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn set_toml_value_keeps_types() {
        let mut root: toml::Value = toml::from_str(
            r#"
[dashboard]
jobs_limit = 20
collision_status = "OPEN"

[logging]
enabled = true
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "dashboard.jobs_limit", "50").unwrap();
        set_toml_value(&mut root, "dashboard.collision_status", "").unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();

        assert_eq!(root["dashboard"]["jobs_limit"].as_integer(), Some(50));
        assert_eq!(root["dashboard"]["collision_status"].as_str(), Some(""));
        assert_eq!(root["logging"]["enabled"].as_bool(), Some(false));
        assert!(set_toml_value(&mut root, "dashboard.jobs_limit", "many").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_section() {
        let mut root: toml::Value = toml::from_str("[api]\ntimeout_ms = 0\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "api.", "value").is_err());
    }

    #[test]
    fn key_lookup_and_section_backfill() {
        let full = toml::Value::try_from(DashConfig::default()).unwrap();
        assert!(ensure_key_exists(&full, "dashboard.picker_limit").is_ok());
        assert!(ensure_key_exists(&full, "dashboard.nope").is_err());

        let mut root: toml::Value = toml::from_str("[api]\ntimeout_ms = 0\n").unwrap();
        ensure_section(&mut root, &full, "logging.level");
        assert_eq!(root["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn effective_config_serializes() {
        let toml_str = show_effective_config().unwrap();
        let _: DashConfig = toml::from_str(&toml_str).unwrap();
    }
}
