//! Credential check against the configured allow-list.

use std::fmt;

use chrono::{DateTime, Utc};

use super::session::{Session, SessionUser};
use crate::config::schema::UserEntry;

/// Credentials did not match any allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRejected {
    InvalidCredentials,
    /// The matched record could not be encoded into a token.
    TokenError(String),
}

impl fmt::Display for LoginRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::TokenError(msg) => write!(f, "could not create session: {msg}"),
        }
    }
}

impl std::error::Error for LoginRejected {}

/// Match `email`/`password` exactly against `users` and mint a session that
/// expires `ttl` after `now`.
pub fn attempt_login(
    users: &[UserEntry],
    email: &str,
    password: &str,
    ttl: chrono::Duration,
    now: DateTime<Utc>,
) -> Result<Session, LoginRejected> {
    let user = users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .ok_or(LoginRejected::InvalidCredentials)?;

    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| LoginRejected::TokenError(format!("session lifetime {ttl} is out of range")))?;

    Session::mint(SessionUser {
        email: user.email.clone(),
        name: user.name.clone(),
        expires_at: Some(expires_at),
    })
    .map_err(|e| LoginRejected::TokenError(e.to_string()))
}
