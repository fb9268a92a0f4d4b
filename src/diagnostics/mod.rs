//! Diagnostics channel: structured log of silent failures.
//!
//! Fetch failures and rejected sessions are never shown to the dashboard
//! user. They are appended here instead, one JSON object per line, and echoed
//! to stderr.
//!
//! Log file: `~/.timelens/diagnostics.jsonl`

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::config::schema::DiagnosticsConfig;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A metrics request failed; the previous dataset was kept.
    FetchFailed,
    /// A fetch was not issued because the selection is invalid.
    FetchRejected,
    /// A fetch completed after a newer one was issued and was discarded.
    FetchStale,
    /// The `filters` cookie could not be decoded.
    FilterCookieIgnored,
    /// An `authToken` cookie was present but unusable.
    SessionRejected,
}

/// A single diagnostics entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: String,
    pub kind: EventKind,
    /// Endpoint or route involved, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endpoint: Option<String>,
    /// Feature name for time-series requests.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub feature: Option<String>,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            endpoint: None,
            feature: None,
            message: message.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_feature(mut self, feature: Option<&str>) -> Self {
        self.feature = feature.map(str::to_string);
        self
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Where diagnostics go.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    path: Option<PathBuf>,
    echo: bool,
}

impl Diagnostics {
    /// File-backed sink under `~/.timelens/`, echoing to stderr.
    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self {
            path: if config.enabled { default_log_path() } else { None },
            echo: true,
        }
    }

    /// Sink that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Sink writing to an explicit file, without stderr echo.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            echo: false,
        }
    }

    /// Record an event. Best-effort: write failures are ignored.
    pub fn record(&self, event: DiagnosticEvent) {
        if self.echo {
            eprintln!("{} {}", "warning:".yellow().bold(), event.message);
        }
        let _ = self.append(&event);
    }

    /// Read back every event in the log. Malformed lines are skipped.
    pub fn read_all(&self) -> Vec<DiagnosticEvent> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect()
    }

    fn append(&self, event: &DiagnosticEvent) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

/// Return the path to the diagnostics log file.
pub fn default_log_path() -> Option<PathBuf> {
    crate::config::state_dir().map(|dir| dir.join("diagnostics.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
