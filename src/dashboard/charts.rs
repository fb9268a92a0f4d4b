//! Chart view models.
//!
//! Pure mapping from datasets to the shapes the page draws. No state and no
//! ordering decisions: bars are emitted in the order the controller stores
//! them.

use serde::Serialize;

use crate::filters::FilterSelection;
use crate::metrics::{AggregateDatum, TimeSeriesDatum};

pub const TOTAL_TIME_LABEL: &str = "Total Time Spent";
pub const LINE_CHART_TITLE: &str = "Total Time Spent Per Day";

const BAR_BACKGROUND: &str = "rgba(75, 192, 192, 0.6)";
const BAR_BORDER: &str = "rgba(75, 192, 192, 1)";

/// One clickable bar, tagged with the feature it represents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSegment {
    pub feature: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

/// Horizontal bar chart of total time per feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub segments: Vec<BarSegment>,
    pub dataset: BarDataset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub data: Vec<f64>,
}

/// Daily line chart for the selected feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    /// `YYYY-MM-DD` x-axis categories.
    pub categories: Vec<String>,
    pub series: Vec<LineSeries>,
}

/// Everything the dashboard page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub filters: FilterSelection,
    pub bar_chart: BarChart,
    pub line_chart: LineChart,
    pub selected_feature: Option<String>,
}

pub fn bar_chart(aggregate: &[AggregateDatum]) -> BarChart {
    BarChart {
        labels: aggregate.iter().map(|d| d.feature.clone()).collect(),
        segments: aggregate
            .iter()
            .map(|d| BarSegment {
                feature: d.feature.clone(),
                value: d.total_time_spent,
            })
            .collect(),
        dataset: BarDataset {
            label: TOTAL_TIME_LABEL.to_string(),
            data: aggregate.iter().map(|d| d.total_time_spent).collect(),
            background_color: BAR_BACKGROUND.to_string(),
            border_color: BAR_BORDER.to_string(),
            border_width: 1,
        },
    }
}

pub fn line_chart(series: &[TimeSeriesDatum]) -> LineChart {
    LineChart {
        title: LINE_CHART_TITLE.to_string(),
        categories: series
            .iter()
            .map(|d| d.date.format("%Y-%m-%d").to_string())
            .collect(),
        series: vec![LineSeries {
            name: TOTAL_TIME_LABEL.to_string(),
            data: series.iter().map(|d| d.total_time_spent).collect(),
        }],
    }
}
