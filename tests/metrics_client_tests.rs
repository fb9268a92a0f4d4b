/// Metrics client tests against a throwaway local HTTP server.
///
/// Each test binds `tiny_http` on an ephemeral port, answers a single request
/// with a canned response and hands the observed request URL back to the test.
use std::sync::mpsc;
use std::thread;

use tiny_http::{Header, Response, Server};

use timelens::filters::FilterSelection;
use timelens::metrics::{HttpMetricsClient, MetricsSource};

// ---------------------------------------------------------------------------
// Fixture server
// ---------------------------------------------------------------------------

/// Serve one request with `status` and `body`. Returns the base URL and a
/// receiver yielding the request URL (path plus query).
fn serve_once(status: u16, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let server = Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("ip listener");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let _ = tx.send(request.url().to_string());
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
        }
    });

    (format!("http://{addr}"), rx)
}

fn query_pairs(url: &str) -> Vec<(String, String)> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[test]
fn aggregate_sends_all_four_filters() {
    let (base, rx) = serve_once(200, r#"[{"feature":"Search","totalTimeSpent":120.5}]"#);
    let client = HttpMetricsClient::new(&base);

    let selection = FilterSelection::from_fields(">25", "Female", "03-10-2022", "05-10-2022").unwrap();
    let data = client.fetch_aggregate(&selection).unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].feature, "Search");
    assert_eq!(data[0].total_time_spent, 120.5);

    let url = rx.recv().unwrap();
    assert!(url.starts_with("/api/data?"));
    let pairs = query_pairs(&url);
    assert_eq!(param(&pairs, "age"), Some(">25"));
    assert_eq!(param(&pairs, "gender"), Some("Female"));
    assert_eq!(param(&pairs, "startDate"), Some("03-10-2022"));
    assert_eq!(param(&pairs, "endDate"), Some("05-10-2022"));
}

#[test]
fn aggregate_reports_http_status() {
    let (base, _rx) = serve_once(503, r#"{"error":"down"}"#);
    let client = HttpMetricsClient::new(&base);

    let err = client.fetch_aggregate(&FilterSelection::default()).unwrap_err();
    assert!(err.to_string().contains("HTTP 503"), "got: {err:#}");
}

#[test]
fn aggregate_rejects_non_list_body() {
    let (base, _rx) = serve_once(200, r#"{"feature":"Search"}"#);
    let client = HttpMetricsClient::new(&base);

    let err = client.fetch_aggregate(&FilterSelection::default()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to decode JSON"));
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

#[test]
fn time_series_sends_feature_and_parses_dates() {
    let body = r#"[
        {"date":"2022-10-01","totalTimeSpent":10,"count":2},
        {"date":"2022-10-02T00:00:00.000Z","totalTimeSpent":12.5}
    ]"#;
    let (base, rx) = serve_once(200, body);
    let client = HttpMetricsClient::new(&base);

    let series = client
        .fetch_time_series("Search & Filter", &FilterSelection::default())
        .unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date.to_string(), "2022-10-01");
    assert_eq!(series[0].count, 2);
    assert_eq!(series[1].date.to_string(), "2022-10-02");
    assert_eq!(series[1].count, 0);

    let url = rx.recv().unwrap();
    assert!(url.starts_with("/api/time-trend-data?"));
    let pairs = query_pairs(&url);
    assert_eq!(param(&pairs, "feature"), Some("Search & Filter"));
    assert_eq!(param(&pairs, "startDate"), Some("01-10-2022"));
}

#[test]
fn reachability_counts_any_status() {
    let (base, _rx) = serve_once(404, "{}");
    assert!(HttpMetricsClient::new(&base).is_reachable());
}
