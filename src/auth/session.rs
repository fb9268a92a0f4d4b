//! Session tokens and the session gate.
//!
//! The token is base64-encoded JSON describing the logged-in user. It is not
//! signed and grants nothing beyond passing this gate: the login flow is a
//! demo gate, not a security boundary.
//!
//! The gate accepts a token when it decodes to JSON with a non-empty,
//! email-like `email` field and, if it carries `expiresAt`, that instant has
//! not passed. Anything else is treated as "not logged in" and the cookie is
//! cleared.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::cookies::{Cookie, CookieJar};

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "authToken";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email regex is valid"));

// ---------------------------------------------------------------------------
// Token payload
// ---------------------------------------------------------------------------

/// The user record carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A minted session: the token string and the user it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    /// Encode `user` into a token.
    pub fn mint(user: SessionUser) -> Result<Self> {
        let json = serde_json::to_vec(&user).context("failed to encode session user")?;
        Ok(Self {
            token: BASE64_STANDARD.encode(json),
            user,
        })
    }

    /// The `authToken` cookie for this session.
    pub fn cookie(&self, ttl: chrono::Duration) -> Cookie {
        Cookie::with_max_age(AUTH_COOKIE, self.token.clone(), ttl.num_seconds())
    }
}

/// Decode and check a token.
pub fn decode_token(token: &str, now: DateTime<Utc>) -> Result<SessionUser> {
    let bytes = BASE64_STANDARD
        .decode(token.trim())
        .context("session token is not base64")?;
    let user: SessionUser =
        serde_json::from_slice(&bytes).context("session token is not a JSON user record")?;

    if !EMAIL_RE.is_match(user.email.trim()) {
        anyhow::bail!("session token has no email");
    }
    if let Some(expires_at) = user.expires_at
        && expires_at <= now
    {
        anyhow::bail!("session token expired at {}", expires_at.to_rfc3339());
    }

    Ok(user)
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Authorized(SessionUser),
    /// No token at all.
    Anonymous,
    /// A token was present but unusable; it has been removed from the jar.
    Rejected(String),
}

impl GateDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Check the session cookie. Unusable tokens are removed from `jar`.
pub fn authorize(jar: &mut CookieJar, now: DateTime<Utc>) -> GateDecision {
    let Some(token) = jar.get(AUTH_COOKIE).filter(|t| !t.is_empty()) else {
        return GateDecision::Anonymous;
    };

    match decode_token(token, now) {
        Ok(user) => GateDecision::Authorized(user),
        Err(e) => {
            jar.remove(AUTH_COOKIE);
            GateDecision::Rejected(format!("{e:#}"))
        }
    }
}

/// Whether the jar holds a usable session.
pub fn is_authorized(jar: &mut CookieJar, now: DateTime<Utc>) -> bool {
    authorize(jar, now).is_authorized()
}

/// End the session.
pub fn logout(jar: &mut CookieJar) {
    jar.remove(AUTH_COOKIE);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> SessionUser {
        SessionUser {
            email: email.to_string(),
            name: "Demo".to_string(),
            expires_at: None,
        }
    }

    fn jar_with(token: &str) -> CookieJar {
        let mut jar = CookieJar::new();
        jar.set(Cookie::session(AUTH_COOKIE, token));
        jar
    }

    #[test]
    fn minted_token_decodes() {
        let session = Session::mint(user("demo@example.com")).unwrap();
        let decoded = decode_token(&session.token, Utc::now()).unwrap();
        assert_eq!(decoded, session.user);
    }

    #[test]
    fn token_is_plain_base64_json() {
        let session = Session::mint(user("demo@example.com")).unwrap();
        let raw = BASE64_STANDARD.decode(&session.token).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["email"], "demo@example.com");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn absent_token_is_anonymous() {
        let mut jar = CookieJar::new();
        assert_eq!(authorize(&mut jar, Utc::now()), GateDecision::Anonymous);
        assert!(jar.changes().is_empty());
    }

    #[test]
    fn garbage_token_is_rejected_and_cleared() {
        let mut jar = jar_with("not base64 at all!");
        let decision = authorize(&mut jar, Utc::now());

        assert!(matches!(decision, GateDecision::Rejected(_)));
        assert_eq!(jar.get(AUTH_COOKIE), None);
        assert!(jar.changes().last().unwrap().is_removal());
    }

    #[test]
    fn base64_of_non_json_is_rejected() {
        let mut jar = jar_with(&BASE64_STANDARD.encode("hello"));
        assert!(!is_authorized(&mut jar, Utc::now()));
        assert_eq!(jar.get(AUTH_COOKIE), None);
    }

    #[test]
    fn token_without_email_is_rejected() {
        let token = BASE64_STANDARD.encode(r#"{"name":"Nobody"}"#);
        assert!(decode_token(&token, Utc::now()).is_err());

        let token = BASE64_STANDARD.encode(r#"{"email":"not-an-email"}"#);
        assert!(decode_token(&token, Utc::now()).is_err());
    }

    #[test]
    fn legacy_token_with_extra_fields_is_accepted() {
        let token = BASE64_STANDARD
            .encode(r#"{"email":"demo@example.com","password":"password123","name":"Demo"}"#);
        let decoded = decode_token(&token, Utc::now()).unwrap();
        assert_eq!(decoded.email, "demo@example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let mut expired = user("demo@example.com");
        expired.expires_at = Some(now - chrono::Duration::minutes(1));
        let session = Session::mint(expired).unwrap();

        let mut jar = jar_with(&session.token);
        assert!(matches!(authorize(&mut jar, now), GateDecision::Rejected(msg) if msg.contains("expired")));
    }

    #[test]
    fn cookie_carries_ttl() {
        let session = Session::mint(user("demo@example.com")).unwrap();
        let cookie = session.cookie(chrono::Duration::days(1));
        assert_eq!(cookie.name, AUTH_COOKIE);
        assert_eq!(cookie.max_age, Some(86_400));
    }

    #[test]
    fn logout_removes_cookie() {
        let session = Session::mint(user("demo@example.com")).unwrap();
        let mut jar = jar_with(&session.token);
        logout(&mut jar);
        assert!(!is_authorized(&mut jar, Utc::now()));
    }
}
