//! Embedded web dashboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - the login page and the session-gated dashboard page
//! - JSON endpoints driving the dashboard controller of the current session
//!
//! Launched via `timelens serve` (default: `http://127.0.0.1:5173`).
//!
//! Requests are handled one at a time. Each browser session (keyed by its
//! `authToken`) owns one [`Dashboard`]; loading `/dashboard` remounts it.

mod api;
pub mod pages;

use std::collections::HashMap;
use std::io::{Cursor, Read};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::auth::{self, GateDecision};
use crate::config::TimelensConfig;
use crate::dashboard::Dashboard;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, EventKind};
use crate::filters::FilterSelection;
use crate::filters::store::{self, FILTERS_COOKIE};
use crate::metrics::{HttpMetricsClient, MetricsSource};
use crate::utils::browser;
use crate::utils::cookies::CookieJar;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server.
///
/// Blocks the current thread. Errors in a single request produce a 500
/// response and never stop the server.
pub fn serve(config: TimelensConfig, open_browser: bool) -> Result<()> {
    let addr = config.server.addr.clone();
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("timelens dashboard running at http://{addr}");
    println!("metrics service: {}", config.metrics.base_url);
    println!("Press Ctrl+C to stop.\n");

    if open_browser {
        let _ = browser::open(&format!("http://{addr}/login"));
    }

    let source = HttpMetricsClient::from_config(&config.metrics);
    let diagnostics = Diagnostics::from_config(&config.diagnostics);
    let mut app = App::new(config, source, diagnostics);

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let header = |name: &'static str| {
            request
                .headers()
                .iter()
                .find(|h| h.field.equiv(name))
                .map(|h| h.value.as_str().to_string())
        };

        let incoming = HttpRequest {
            method: method.clone(),
            url: url.clone(),
            cookie_header: header("Cookie"),
            host: header("Host"),
            body,
        };

        let reply = app.handle(&incoming);
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Request / reply
// ---------------------------------------------------------------------------

/// The parts of an incoming request the handlers look at.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path plus query string.
    pub url: String,
    pub cookie_header: Option<String>,
    pub host: Option<String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
            cookie_header: None,
            host: None,
            body: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_cookies(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, q)| q)
    }
}

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    /// JSON response.
    pub fn json<T: Serialize>(status: u16, data: &T) -> Result<Self> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::new(status, "application/json; charset=utf-8", body))
    }

    /// JSON `{"error": ...}` response.
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status, "application/json; charset=utf-8", body.into_bytes())
    }

    /// HTML response.
    pub fn html(status: u16, html: impl Into<String>) -> Self {
        Self::new(status, "text/html; charset=utf-8", html.into().into_bytes())
    }

    /// Redirect to `location`.
    pub fn redirect(status: u16, location: &str) -> Self {
        let mut reply = Self::new(status, "text/plain; charset=utf-8", Vec::new());
        reply.headers.push(("Location".to_string(), location.to_string()));
        reply
    }

    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All `Set-Cookie` values.
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("Set-Cookie"))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn with_cookies(mut self, jar: &CookieJar) -> Self {
        for value in jar.set_cookie_headers() {
            self.headers.push(("Set-Cookie".to_string(), value));
        }
        self
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        for (name, value) in &self.headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        response
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Server-side state: configuration plus one dashboard per session token.
pub struct App<S: MetricsSource + Clone> {
    config: TimelensConfig,
    source: S,
    diagnostics: Diagnostics,
    sessions: HashMap<String, Dashboard<S>>,
}

impl<S: MetricsSource + Clone> App<S> {
    pub fn new(config: TimelensConfig, source: S, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            source,
            diagnostics,
            sessions: HashMap::new(),
        }
    }

    /// Dashboard of a session token, if mounted.
    pub fn dashboard(&self, token: &str) -> Option<&Dashboard<S>> {
        self.sessions.get(token)
    }

    /// Number of sessions with a dashboard.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop the dashboards of tokens that no longer pass the gate at `now`.
    /// Returns how many were removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|token, dashboard| {
            let live = auth::decode_token(token, now).is_ok();
            if !live {
                dashboard.unmount();
            }
            live
        });
        before - self.sessions.len()
    }

    /// Handle one request. Never fails: errors become a 500 JSON reply.
    pub fn handle(&mut self, request: &HttpRequest) -> Reply {
        let mut jar = CookieJar::from_header(request.cookie_header.as_deref());
        let reply = match self.dispatch(request, &mut jar) {
            Ok(reply) => reply,
            Err(e) => Reply::error(500, &format!("{e:#}")),
        };
        reply.with_cookies(&jar)
    }

    /// Dispatch an incoming request to the appropriate handler.
    fn dispatch(&mut self, request: &HttpRequest, jar: &mut CookieJar) -> Result<Reply> {
        let path = request.path();

        match (&request.method, path) {
            // Pages
            (&Method::Get, "/") => Ok(Reply::redirect(302, "/dashboard")),
            (&Method::Get, "/login") => Ok(Reply::html(200, pages::login_page(None))),
            (&Method::Post, "/login") => self.login(request, jar),
            (&Method::Get, "/logout") | (&Method::Post, "/logout") => Ok(self.logout(jar)),
            (&Method::Get, "/dashboard") => self.dashboard_page(request, jar),

            // API: dashboard
            (_, p) if p.starts_with("/api/dashboard") => self.dashboard_api(request, jar),

            // API: health
            (&Method::Get, "/api/health") => api::get_health(&self.config),

            _ => Ok(Reply::error(404, "not found")),
        }
    }

    // -- auth ---------------------------------------------------------------

    fn login(&mut self, request: &HttpRequest, jar: &mut CookieJar) -> Result<Reply> {
        let body = request.body.as_deref().unwrap_or("");
        let mut email = String::new();
        let mut password = String::new();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "email" => email = value.into_owned(),
                "password" => password = value.into_owned(),
                _ => {}
            }
        }

        let ttl = self.config.auth.session_ttl();
        match auth::attempt_login(&self.config.auth.users, email.trim(), &password, ttl, Utc::now()) {
            Ok(session) => {
                // The new token replaces whatever this browser held before.
                if let Some(previous) = jar.get(auth::AUTH_COOKIE)
                    && let Some(mut dashboard) = self.sessions.remove(previous)
                {
                    dashboard.unmount();
                }
                jar.set(session.cookie(ttl));
                Ok(Reply::redirect(303, "/dashboard"))
            }
            Err(rejected) => Ok(Reply::html(200, pages::login_page(Some(&rejected.to_string())))),
        }
    }

    fn logout(&mut self, jar: &mut CookieJar) -> Reply {
        if let Some(token) = jar.get(auth::AUTH_COOKIE).map(str::to_string)
            && let Some(mut dashboard) = self.sessions.remove(&token)
        {
            dashboard.unmount();
        }
        auth::logout(jar);
        Reply::redirect(302, "/login")
    }

    /// Run the session gate. Returns the session token when authorized.
    fn gate(&mut self, jar: &mut CookieJar, route: &str) -> Option<String> {
        let token = jar.get(auth::AUTH_COOKIE).map(str::to_string);
        match auth::authorize(jar, Utc::now()) {
            GateDecision::Authorized(_) => token,
            GateDecision::Anonymous => None,
            GateDecision::Rejected(reason) => {
                if let Some(token) = token
                    && let Some(mut dashboard) = self.sessions.remove(&token)
                {
                    dashboard.unmount();
                }
                self.diagnostics.record(
                    DiagnosticEvent::new(EventKind::SessionRejected, format!("session rejected: {reason}"))
                        .with_endpoint(route),
                );
                None
            }
        }
    }

    // -- dashboard ----------------------------------------------------------

    /// `GET /dashboard`: (re)mount the session's dashboard and serve the page.
    fn dashboard_page(&mut self, request: &HttpRequest, jar: &mut CookieJar) -> Result<Reply> {
        let Some(token) = self.gate(jar, request.path()) else {
            return Ok(Reply::redirect(302, "/login"));
        };

        if let Some(raw) = jar.get(FILTERS_COOKIE)
            && let Err(e) = FilterSelection::from_cookie_json(raw)
        {
            self.diagnostics.record(
                DiagnosticEvent::new(EventKind::FilterCookieIgnored, format!("{e:#}"))
                    .with_endpoint(request.path()),
            );
        }

        let initial = store::resolve_from_jar(request.query(), jar, &self.config.filters.selection());
        self.evict_expired(Utc::now());

        let dashboard = self
            .sessions
            .entry(token)
            .or_insert_with(|| Dashboard::new(self.source.clone(), self.diagnostics.clone()));
        dashboard.unmount();
        dashboard.mount(initial);

        Ok(Reply::html(200, pages::DASHBOARD_HTML))
    }

    /// `/api/dashboard/*`: gated JSON endpoints for the mounted dashboard.
    fn dashboard_api(&mut self, request: &HttpRequest, jar: &mut CookieJar) -> Result<Reply> {
        let Some(token) = self.gate(jar, request.path()) else {
            return Ok(Reply::error(401, "unauthorized"));
        };
        let base_url = self.share_base(request);
        let Some(dashboard) = self.sessions.get_mut(&token) else {
            return Ok(Reply::error(409, "dashboard not mounted; reload /dashboard"));
        };

        let body = request.body.as_deref().unwrap_or("");
        match (&request.method, request.path()) {
            (&Method::Get, "/api/dashboard") => api::get_view(dashboard),
            (&Method::Put, "/api/dashboard/filters") => api::put_filter(dashboard, jar, body),
            (&Method::Post, "/api/dashboard/apply") => api::post_apply(dashboard),
            (&Method::Post, "/api/dashboard/select") => api::post_select(dashboard, body),
            (&Method::Get, "/api/dashboard/share") => api::get_share(dashboard, &base_url),
            _ => Ok(Reply::error(404, "not found")),
        }
    }

    /// Absolute URL of the dashboard page as seen by the browser.
    fn share_base(&self, request: &HttpRequest) -> String {
        let host = request
            .host
            .clone()
            .unwrap_or_else(|| self.config.server.addr.clone());
        format!("http://{host}/dashboard")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
