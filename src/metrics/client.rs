/// HTTP client for the external metrics service.
///
/// Uses the synchronous `ureq` client. Every call is one attempt: no caching,
/// no retries. A request timeout applies only when `metrics.timeout_ms` is
/// non-zero.
///
/// Endpoints (relative to `metrics.base_url`):
///
/// - `GET /api/data?age=&gender=&startDate=&endDate=`
/// - `GET /api/time-trend-data?feature=&age=&gender=&startDate=&endDate=`
///
/// Dates are sent in the same `DD-MM-YYYY` form used for the URL and cookie.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::{AggregateDatum, MetricsSource, TimeSeriesDatum};
use crate::config::schema::MetricsConfig;
use crate::filters::FilterSelection;

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Synchronous metrics service client.
#[derive(Debug, Clone)]
pub struct HttpMetricsClient {
    base_url: String,
    aggregate_path: String,
    time_series_path: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl HttpMetricsClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &MetricsConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));

        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            aggregate_path: normalize_path(&config.aggregate_path),
            time_series_path: normalize_path(&config.time_series_path),
            timeout,
            agent: builder.build(),
        }
    }

    /// Client with default endpoint paths against `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::from_config(&MetricsConfig {
            base_url: base_url.to_string(),
            ..MetricsConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the aggregate endpoint (without query).
    pub fn aggregate_url(&self) -> String {
        format!("{}{}", self.base_url, self.aggregate_path)
    }

    /// Full URL of the time-series endpoint (without query).
    pub fn time_series_url(&self) -> String {
        format!("{}{}", self.base_url, self.time_series_path)
    }

    /// Check whether the service answers HTTP at all.
    ///
    /// Any status code counts as reachable; only transport failures do not.
    /// Capped at five seconds so `/api/health` never stalls.
    pub fn is_reachable(&self) -> bool {
        let timeout = self
            .timeout
            .map_or(REACHABILITY_TIMEOUT, |t| t.min(REACHABILITY_TIMEOUT));
        let result = self.agent.get(&self.base_url).timeout(timeout).call();

        matches!(result, Ok(_) | Err(ureq::Error::Status(..)))
    }

    /// Issue a GET with query parameters and decode the JSON body.
    fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        let mut request = self.agent.get(url);
        for (key, value) in params {
            request = request.query(key, value);
        }

        let response = match request.call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                anyhow::bail!("{url} returned HTTP {code} {}", resp.status_text())
            }
            Err(e) => return Err(e).with_context(|| format!("request to {url} failed")),
        };

        response
            .into_json::<T>()
            .with_context(|| format!("failed to decode JSON from {url}"))
    }
}

impl MetricsSource for HttpMetricsClient {
    fn fetch_aggregate(&self, selection: &FilterSelection) -> Result<Vec<AggregateDatum>> {
        let params = selection.query_pairs();
        self.get_json(&self.aggregate_url(), &params)
    }

    fn fetch_time_series(&self, feature: &str, selection: &FilterSelection) -> Result<Vec<TimeSeriesDatum>> {
        let mut params = vec![("feature", feature.to_string())];
        params.extend(selection.query_pairs());
        self.get_json(&self.time_series_url(), &params)
    }

    fn aggregate_endpoint(&self) -> String {
        self.aggregate_url()
    }

    fn time_series_endpoint(&self) -> String {
        self.time_series_url()
    }
}

/// Ensure an endpoint path starts with exactly one `/`.
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
