//! Minimal cookie jar for the web dashboard.
//!
//! A [`CookieJar`] is built from the request's `Cookie` header, read and
//! mutated by handlers, and then rendered back as `Set-Cookie` headers for
//! the response. Values are percent-encoded on the way out and decoded on the
//! way in, so JSON and base64 payloads survive the trip unchanged.

use std::collections::BTreeMap;

/// A cookie to be sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// `Max-Age` in seconds. `None` means a browser-session cookie.
    pub max_age: Option<i64>,
}

impl Cookie {
    /// Cookie without an expiry.
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
        }
    }

    /// Cookie that expires after `max_age_secs` seconds.
    pub fn with_max_age(name: impl Into<String>, value: impl Into<String>, max_age_secs: i64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: Some(max_age_secs),
        }
    }

    /// Cookie that instructs the browser to delete `name`.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::with_max_age(name, "", 0)
    }

    pub fn is_removal(&self) -> bool {
        self.max_age == Some(0)
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Path=/; SameSite=Lax",
            self.name,
            urlencoding::encode(&self.value)
        );
        if let Some(secs) = self.max_age {
            out.push_str(&format!("; Max-Age={secs}"));
        }
        out
    }
}

/// Request cookies plus the changes a handler made to them.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    values: BTreeMap<String, String>,
    changes: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie: a=1; b=2` request header.
    ///
    /// Pairs without `=` are skipped. Values that are not valid
    /// percent-encoding are kept verbatim.
    pub fn from_header(header: Option<&str>) -> Self {
        let mut jar = Self::new();
        let Some(header) = header else {
            return jar;
        };

        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"');
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            jar.values.insert(name.to_string(), decoded);
        }

        jar
    }

    /// Current value of a cookie, reflecting changes made in this request.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Set a cookie, replacing both the visible value and any earlier
    /// pending change for the same name.
    pub fn set(&mut self, cookie: Cookie) {
        if cookie.is_removal() {
            self.values.remove(&cookie.name);
        } else {
            self.values.insert(cookie.name.clone(), cookie.value.clone());
        }
        self.changes.retain(|c| c.name != cookie.name);
        self.changes.push(cookie);
    }

    /// Delete a cookie in the browser.
    pub fn remove(&mut self, name: &str) {
        self.set(Cookie::removal(name));
    }

    /// Changes made since the jar was built, in order.
    pub fn changes(&self) -> &[Cookie] {
        &self.changes
    }

    /// `Set-Cookie` header values for every pending change.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.changes.iter().map(Cookie::to_header_value).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
