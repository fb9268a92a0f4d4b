//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an endpoint and returns a [`Reply`] with JSON
//! content. Client mistakes (bad body, unknown bar) answer 400; fetch
//! failures are not errors here: the previous data is simply returned.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{self, TimelensConfig};
use crate::dashboard::Dashboard;
use crate::dashboard::charts::DashboardView;
use crate::dashboard::controller::{BarSelection, Completion};
use crate::filters::store::FilterEdit;
use crate::metrics::{HttpMetricsClient, MetricsSource};
use crate::utils::cookies::CookieJar;

use super::Reply;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// `PUT /api/dashboard/filters` body.
#[derive(Debug, Deserialize)]
struct FilterEditRequest {
    field: String,
    value: String,
}

/// `POST /api/dashboard/select` body: the clicked segment's feature, or its
/// position in the displayed label list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectRequest {
    Feature { feature: String },
    Index { index: usize },
}

impl From<SelectRequest> for BarSelection {
    fn from(req: SelectRequest) -> Self {
        match req {
            SelectRequest::Feature { feature } => Self::Feature(feature),
            SelectRequest::Index { index } => Self::Index(index),
        }
    }
}

/// View plus the result of the fetch the action triggered, if any.
#[derive(Debug, Serialize)]
struct ActionResponse {
    #[serde(flatten)]
    view: DashboardView,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ShareResponse {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    metrics_base_url: String,
    metrics_reachable: bool,
    config_file: Option<String>,
    config_exists: bool,
    diagnostics_log: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn completion_name(completion: Completion) -> &'static str {
    match completion {
        Completion::Applied => "applied",
        Completion::Stale => "stale",
        Completion::Failed => "failed",
    }
}

fn action_response<S: MetricsSource>(dashboard: &Dashboard<S>, completion: Option<Completion>) -> Result<Reply> {
    Reply::json(
        200,
        &ActionResponse {
            view: dashboard.view(),
            fetch: completion.map(completion_name),
        },
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/dashboard`: current filters and chart data.
pub fn get_view<S: MetricsSource>(dashboard: &Dashboard<S>) -> Result<Reply> {
    action_response(dashboard, None)
}

/// `PUT /api/dashboard/filters`: edit one field and persist the cookie.
///
/// Expects `{ "field": "startDate", "value": "03-10-2022" }`.
pub fn put_filter<S: MetricsSource>(dashboard: &mut Dashboard<S>, jar: &mut CookieJar, body: &str) -> Result<Reply> {
    let req: FilterEditRequest = match serde_json::from_str(body) {
        Ok(req) => req,
        Err(e) => return Ok(Reply::error(400, &format!("invalid filter edit: {e}"))),
    };
    let edit = match FilterEdit::parse(&req.field, &req.value) {
        Ok(edit) => edit,
        Err(e) => return Ok(Reply::error(400, &format!("{e:#}"))),
    };

    dashboard.edit_filter(edit, jar)?;
    action_response(dashboard, None)
}

/// `POST /api/dashboard/apply`: refetch the aggregate.
pub fn post_apply<S: MetricsSource>(dashboard: &mut Dashboard<S>) -> Result<Reply> {
    match dashboard.apply_filters() {
        Ok(completion) => action_response(dashboard, Some(completion)),
        Err(e) => Ok(Reply::error(400, &format!("{e:#}"))),
    }
}

/// `POST /api/dashboard/select`: drill into one bar.
pub fn post_select<S: MetricsSource>(dashboard: &mut Dashboard<S>, body: &str) -> Result<Reply> {
    let req: SelectRequest = match serde_json::from_str(body) {
        Ok(req) => req,
        Err(_) => return Ok(Reply::error(400, "expected {\"feature\": ...} or {\"index\": ...}")),
    };

    match dashboard.select_bar(&req.into()) {
        Ok(completion) => action_response(dashboard, Some(completion)),
        Err(e) => Ok(Reply::error(400, &format!("{e:#}"))),
    }
}

/// `GET /api/dashboard/share`: shareable URL for the current selection.
pub fn get_share<S: MetricsSource>(dashboard: &Dashboard<S>, base_url: &str) -> Result<Reply> {
    let url = dashboard.share_url(base_url)?;
    Reply::json(200, &ShareResponse { url })
}

/// `GET /api/health`: metrics service reachability and file locations.
pub fn get_health(config: &TimelensConfig) -> Result<Reply> {
    let client = HttpMetricsClient::from_config(&config.metrics);
    let config_file = config::global_config_file();

    let resp = HealthResponse {
        metrics_base_url: client.base_url().to_string(),
        metrics_reachable: client.is_reachable(),
        config_exists: config_file.as_ref().is_some_and(|p| p.exists()),
        config_file: config_file.map(|p| p.display().to_string()),
        diagnostics_log: crate::diagnostics::default_log_path().map(|p| p.display().to_string()),
    };

    Reply::json(200, &resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
