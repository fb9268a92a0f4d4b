/// Configuration schema and defaults for timelens.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[metrics]`, `[filters]`, `[auth]` and `[diagnostics]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::filters::FilterSelection;
use crate::metrics;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level timelens configuration.
///
/// Maps directly to the `~/.timelens/config.toml` and `.timelens.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelensConfig {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub filters: FiltersConfig,
    pub auth: AuthConfig,
    pub diagnostics: DiagnosticsConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded web server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `timelens serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5173".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [metrics]
// ---------------------------------------------------------------------------

/// External metrics service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Base URL of the metrics service.
    pub base_url: String,
    /// Path of the aggregate-by-feature endpoint.
    pub aggregate_path: String,
    /// Path of the per-feature daily time-series endpoint.
    pub time_series_path: String,
    /// Request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            aggregate_path: metrics::AGGREGATE_PATH.to_string(),
            time_series_path: metrics::TIME_SERIES_PATH.to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [filters]
// ---------------------------------------------------------------------------

/// Default filter selection used when neither URL nor cookie provide one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    pub age: String,
    pub gender: String,
    /// `DD-MM-YYYY`
    pub start_date: String,
    /// `DD-MM-YYYY`
    pub end_date: String,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        let selection = FilterSelection::default();
        let [age, gender, start, end] = selection.query_pairs().map(|(_, v)| v);
        Self {
            age,
            gender,
            start_date: start,
            end_date: end,
        }
    }
}

impl FiltersConfig {
    /// The configured default as a selection.
    ///
    /// Falls back to the built-in default when a configured date does not
    /// parse.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection::from_fields(&self.age, &self.gender, &self.start_date, &self.end_date)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// [auth]
// ---------------------------------------------------------------------------

/// A login allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Login gate settings. This is a demo gate, not a security boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of the `authToken` cookie, in hours.
    pub session_ttl_hours: i64,
    /// Accepted credentials.
    pub users: Vec<UserEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            users: vec![UserEntry {
                email: "demo@example.com".to_string(),
                password: "password123".to_string(),
                name: "Demo User".to_string(),
            }],
        }
    }
}

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

impl AuthConfig {
    /// Session lifetime, clamped to `1..=MAX_SESSION_TTL_HOURS` hours.
    pub fn session_ttl(&self) -> chrono::Duration {
        let hours = self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS);
        chrono::Duration::try_hours(hours).unwrap_or_else(|| chrono::Duration::hours(24))
    }
}

// ---------------------------------------------------------------------------
// [diagnostics]
// ---------------------------------------------------------------------------

/// Diagnostics log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Append failure events to `~/.timelens/diagnostics.jsonl`.
    pub enabled: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl TimelensConfig {
    /// Annotated default config written by `timelens config init`.
    pub fn default_toml() -> &'static str {
        r#"# timelens configuration
# Layers: built-in defaults < ~/.timelens/config.toml < .timelens.toml < TIMELENS_* env vars

[server]
# Listen address for `timelens serve` (env: TIMELENS_ADDR)
addr = "127.0.0.1:5173"
open_browser = true

[metrics]
# Metrics service (env: TIMELENS_METRICS_URL)
base_url = "http://localhost:5000"
aggregate_path = "/api/data"
time_series_path = "/api/time-trend-data"
# 0 = no timeout (env: TIMELENS_METRICS_TIMEOUT_MS)
timeout_ms = 0

[filters]
# Default selection when the URL and the filters cookie provide none
age = "15-25"
gender = "Male"
start_date = "01-10-2022"
end_date = "08-10-2022"

[auth]
session_ttl_hours = 24

[[auth.users]]
email = "demo@example.com"
password = "password123"
name = "Demo User"

[diagnostics]
# Append fetch failures to ~/.timelens/diagnostics.jsonl (env: TIMELENS_DIAGNOSTICS)
enabled = true
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
