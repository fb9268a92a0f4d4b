//! Metrics service access.
//!
//! The dashboard issues two read queries against an external metrics service:
//!
//! - **aggregate**: total time spent per feature for a filter selection
//! - **time series**: per-day totals for one selected feature
//!
//! [`MetricsSource`] is the seam between the dashboard and the transport;
//! [`client::HttpMetricsClient`] is the real implementation.

pub mod client;

use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::filters::FilterSelection;

pub use client::HttpMetricsClient;

/// Default path of the aggregate-by-feature endpoint.
pub const AGGREGATE_PATH: &str = "/api/data";
/// Default path of the per-feature daily time-series endpoint.
pub const TIME_SERIES_PATH: &str = "/api/time-trend-data";

// ---------------------------------------------------------------------------
// Data shapes
// ---------------------------------------------------------------------------

/// One bar of the aggregate chart. Extra fields in the response are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDatum {
    pub feature: String,
    pub total_time_spent: f64,
}

/// One day of a feature's time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesDatum {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    pub total_time_spent: f64,
    #[serde(default)]
    pub count: u64,
}

/// Accept `YYYY-MM-DD`, an RFC 3339 timestamp, or `DD-MM-YYYY`.
fn deserialize_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised date '{raw}'")))
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(raw, crate::filters::DATE_FORMAT).ok())
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Read access to the metrics service.
///
/// Each call is a single best-effort attempt. Errors are returned to the
/// caller, which decides how to report them.
pub trait MetricsSource {
    /// Total time spent per feature for the selection.
    fn fetch_aggregate(&self, selection: &FilterSelection) -> Result<Vec<AggregateDatum>>;

    /// Daily totals for one feature under the selection.
    fn fetch_time_series(&self, feature: &str, selection: &FilterSelection) -> Result<Vec<TimeSeriesDatum>>;

    /// Where aggregate requests go, as reported in diagnostics.
    fn aggregate_endpoint(&self) -> String {
        AGGREGATE_PATH.to_string()
    }

    /// Where time-series requests go, as reported in diagnostics.
    fn time_series_endpoint(&self) -> String {
        TIME_SERIES_PATH.to_string()
    }
}

impl<T: MetricsSource + ?Sized> MetricsSource for &T {
    fn fetch_aggregate(&self, selection: &FilterSelection) -> Result<Vec<AggregateDatum>> {
        (**self).fetch_aggregate(selection)
    }

    fn fetch_time_series(&self, feature: &str, selection: &FilterSelection) -> Result<Vec<TimeSeriesDatum>> {
        (**self).fetch_time_series(feature, selection)
    }

    fn aggregate_endpoint(&self) -> String {
        (**self).aggregate_endpoint()
    }

    fn time_series_endpoint(&self) -> String {
        (**self).time_series_endpoint()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
