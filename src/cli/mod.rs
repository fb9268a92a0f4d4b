//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `timelens serve`: run the web dashboard
//! - `timelens aggregate`: total time spent per feature for a filter selection
//! - `timelens trend FEATURE`: daily totals for one feature
//! - `timelens share`: print the shareable dashboard URL for a selection
//! - `timelens config show|init`: configuration management

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config;
use crate::dashboard::controller::sort_by_feature;
use crate::filters::store::FilterEdit;
use crate::filters::{self, FilterSelection};
use crate::metrics::{AggregateDatum, HttpMetricsClient, MetricsSource, TimeSeriesDatum};
use crate::web;

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Filter flags shared by the data commands. Unset flags keep the configured
/// default selection.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Age bracket, e.g. "15-25" or ">25"
    #[arg(long)]
    pub age: Option<String>,
    /// Gender, e.g. "Male" or "Female"
    #[arg(long)]
    pub gender: Option<String>,
    /// First day of the range (DD-MM-YYYY)
    #[arg(long)]
    pub start_date: Option<String>,
    /// Last day of the range (DD-MM-YYYY)
    #[arg(long)]
    pub end_date: Option<String>,
}

impl FilterArgs {
    /// Apply the given flags over `default`.
    pub fn into_selection(self, default: FilterSelection) -> Result<FilterSelection> {
        let mut selection = default;
        let fields = [
            (filters::FIELD_AGE, self.age),
            (filters::FIELD_GENDER, self.gender),
            (filters::FIELD_START_DATE, self.start_date),
            (filters::FIELD_END_DATE, self.end_date),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                FilterEdit::parse(field, &value)?.apply(&mut selection);
            }
        }
        selection.validate()?;
        Ok(selection)
    }
}

// ---------------------------------------------------------------------------
// timelens serve
// ---------------------------------------------------------------------------

/// Run the web dashboard until interrupted.
pub fn run_serve(addr: Option<String>, no_browser: bool) -> Result<()> {
    let mut cfg = config::load();
    if let Some(addr) = addr {
        cfg.server.addr = addr;
    }
    let open_browser = cfg.server.open_browser && !no_browser;
    web::serve(cfg, open_browser)
}

// ---------------------------------------------------------------------------
// timelens aggregate
// ---------------------------------------------------------------------------

/// Fetch and print the aggregate for a selection, sorted by feature.
pub fn run_aggregate(filter: FilterArgs, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let selection = filter.into_selection(cfg.filters.selection())?;
    let client = HttpMetricsClient::from_config(&cfg.metrics);

    let mut data = client
        .fetch_aggregate(&selection)
        .with_context(|| format!("failed to fetch aggregate from {}", client.aggregate_url()))?;
    sort_by_feature(&mut data);

    if data.is_empty() {
        println!("{}", "No data for this selection.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Csv => print_aggregate_csv(&data),
        OutputFormat::Table => print_aggregate_table(&data, &selection),
    }

    Ok(())
}

fn print_aggregate_table(data: &[AggregateDatum], selection: &FilterSelection) {
    println!("{}", "Total Time Spent".bold().cyan());
    println!("{}", "=".repeat(60));
    print_selection(selection);
    println!();

    let total: f64 = data.iter().map(|d| d.total_time_spent).sum();
    println!("  {:<24} {:>14} {:>8}", "Feature", "Time Spent", "Share");
    println!("  {}", "-".repeat(48));

    for (i, datum) in data.iter().enumerate() {
        let line = format!(
            "  {:<24} {:>14} {:>7.1}%",
            truncate(&datum.feature, 24),
            format_amount(datum.total_time_spent),
            percent(datum.total_time_spent, total),
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    println!("  {}", "-".repeat(48));
    println!("  {:<24} {:>14}", "Total".bold(), format_amount(total));
}

fn print_aggregate_csv(data: &[AggregateDatum]) {
    println!("feature,total_time_spent");
    for d in data {
        println!("{},{}", csv_field(&d.feature), d.total_time_spent);
    }
}

// ---------------------------------------------------------------------------
// timelens trend
// ---------------------------------------------------------------------------

/// Fetch and print one feature's daily totals.
pub fn run_trend(feature: &str, filter: FilterArgs, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let selection = filter.into_selection(cfg.filters.selection())?;
    let client = HttpMetricsClient::from_config(&cfg.metrics);

    let series = client
        .fetch_time_series(feature, &selection)
        .with_context(|| format!("failed to fetch time series from {}", client.time_series_url()))?;

    if series.is_empty() {
        println!("{}", format!("No daily data for '{feature}'.").yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
        OutputFormat::Csv => print_trend_csv(&series),
        OutputFormat::Table => print_trend_table(feature, &series, &selection),
    }

    Ok(())
}

fn print_trend_table(feature: &str, series: &[TimeSeriesDatum], selection: &FilterSelection) {
    println!("{}", format!("Total Time Spent Per Day: {feature}").bold().cyan());
    println!("{}", "=".repeat(50));
    print_selection(selection);
    println!();
    println!("  {:<12} {:>14} {:>8}", "Date", "Time Spent", "Events");
    println!("  {}", "-".repeat(48));

    for datum in series {
        println!(
            "  {:<12} {:>14} {:>8}",
            datum.date.format("%Y-%m-%d"),
            format_amount(datum.total_time_spent),
            datum.count,
        );
    }
}

fn print_trend_csv(series: &[TimeSeriesDatum]) {
    println!("date,total_time_spent,count");
    for d in series {
        println!("{},{},{}", d.date.format("%Y-%m-%d"), d.total_time_spent, d.count);
    }
}

// ---------------------------------------------------------------------------
// timelens share
// ---------------------------------------------------------------------------

/// Print the shareable dashboard URL for a selection.
pub fn run_share(filter: FilterArgs, base_url: Option<String>) -> Result<()> {
    let cfg = config::load();
    let selection = filter.into_selection(cfg.filters.selection())?;
    let base = base_url.unwrap_or_else(|| format!("http://{}/dashboard", cfg.server.addr));
    println!("{}", filters::share::to_shareable_url(&selection, &base)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// timelens config show | init
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective timelens Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.timelens/config.toml");
    print_source(project_exists, ".timelens.toml");
    println!("  {} {}", "·".dimmed(), "TIMELENS_* environment variables".dimmed());

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.timelens/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    println!("  {}", "Edit the file to point at your metrics service.".dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn print_selection(selection: &FilterSelection) {
    println!(
        "  {} {}  {} {}  {} {} .. {}",
        "Age:".bold(),
        selection.age,
        "Gender:".bold(),
        selection.gender,
        "Range:".bold(),
        filters::format_date(selection.start_date),
        filters::format_date(selection.end_date),
    );
}

/// Format an amount with comma separators, keeping up to two decimals.
fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc().abs() as u64;
    let frac = ((rounded.abs() - rounded.abs().trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let mut result: String = grouped.chars().rev().collect();
    if rounded < 0.0 {
        result.insert(0, '-');
    }
    if frac > 0 {
        result.push_str(&format!(".{frac:02}"));
    }
    result
}

fn percent(part: f64, total: f64) -> f64 {
    if total == 0.0 { 0.0 } else { part / total * 100.0 }
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator or quote.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
