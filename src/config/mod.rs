/// Configuration system for timelens.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::TimelensConfig::default()`]
/// 2. **User global config**: `~/.timelens/config.toml`
/// 3. **Project local config**: `.timelens.toml` in the current working directory
/// 4. **Environment variables**: `TIMELENS_*` overrides (highest precedence)
///
/// A file layer replaces the previous one wholesale; because every section
/// deserializes with defaults, keys a file leaves unset keep their built-in
/// values.
///
/// # Usage
///
/// ```rust,ignore
/// use timelens::config;
///
/// let cfg = config::load();
/// let client = HttpMetricsClient::from_config(&cfg.metrics);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::TimelensConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> TimelensConfig {
    let mut config = TimelensConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Missing or malformed files yield `None`; a broken config file must not
/// stop the dashboard from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<TimelensConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding user-level state: `~/.timelens/`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".timelens"))
}

/// Path to the user global config: `~/.timelens/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config: `.timelens.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".timelens.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides (highest precedence layer).
///
/// `lookup` returns the value of a variable, if set. Supported variables:
/// - `TIMELENS_ADDR`: web server listen address
/// - `TIMELENS_METRICS_URL`: metrics service base URL
/// - `TIMELENS_METRICS_TIMEOUT_MS`: metrics request timeout
/// - `TIMELENS_DIAGNOSTICS`: diagnostics log (`1`/`true`/`yes`/`on`)
fn apply_overrides(config: &mut TimelensConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("TIMELENS_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Some(val) = lookup("TIMELENS_METRICS_URL")
        && !val.is_empty()
    {
        config.metrics.base_url = val;
    }
    if let Some(val) = lookup("TIMELENS_METRICS_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.metrics.timeout_ms = ms;
    }
    if let Some(val) = lookup("TIMELENS_DIAGNOSTICS") {
        config.diagnostics.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.timelens/config.toml`.
///
/// Returns an error if the file already exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.timelens/ directory")?;
    }

    fs::write(&path, TimelensConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
