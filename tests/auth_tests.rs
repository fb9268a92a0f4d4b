/// Login and session gate tests.
///
/// Exercises the cookie round trip a browser performs: login sets
/// `authToken`, later requests present it, and the gate decides.
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{Duration, TimeZone, Utc};

use timelens::auth::{self, AUTH_COOKIE, GateDecision, LoginRejected};
use timelens::config::schema::AuthConfig;
use timelens::utils::cookies::CookieJar;

/// Replay the `Set-Cookie` headers of `jar` as a request `Cookie` header.
fn replay(jar: &CookieJar) -> CookieJar {
    let header = jar
        .set_cookie_headers()
        .iter()
        .filter_map(|h| h.split(';').next().map(str::to_string))
        .collect::<Vec<_>>()
        .join("; ");
    CookieJar::from_header(Some(&header))
}

#[test]
fn login_cookie_passes_gate() {
    let config = AuthConfig::default();
    let now = Utc.with_ymd_and_hms(2022, 10, 1, 12, 0, 0).unwrap();
    let session = auth::attempt_login(&config.users, "demo@example.com", "password123", config.session_ttl(), now)
        .unwrap();

    let mut response = CookieJar::new();
    response.set(session.cookie(config.session_ttl()));
    let mut request = replay(&response);

    match auth::authorize(&mut request, now + Duration::hours(1)) {
        GateDecision::Authorized(user) => {
            assert_eq!(user.email, "demo@example.com");
            assert_eq!(user.name, "Demo User");
        }
        other => panic!("expected authorized, got {other:?}"),
    }
    assert!(request.changes().is_empty());
}

#[test]
fn token_never_contains_password() {
    let config = AuthConfig::default();
    let session =
        auth::attempt_login(&config.users, "demo@example.com", "password123", config.session_ttl(), Utc::now())
            .unwrap();
    let json = BASE64_STANDARD.decode(&session.token).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(payload["email"], "demo@example.com");
    assert!(payload.get("password").is_none());
    assert!(!String::from_utf8_lossy(&json).contains("password123"));
}

#[test]
fn expired_login_is_rejected_and_cleared() {
    let config = AuthConfig::default();
    let now = Utc.with_ymd_and_hms(2022, 10, 1, 12, 0, 0).unwrap();
    let session = auth::attempt_login(&config.users, "demo@example.com", "password123", config.session_ttl(), now)
        .unwrap();

    let mut response = CookieJar::new();
    response.set(session.cookie(config.session_ttl()));
    let mut request = replay(&response);

    let decision = auth::authorize(&mut request, now + Duration::hours(25));
    assert!(matches!(decision, GateDecision::Rejected(_)));
    assert_eq!(request.get(AUTH_COOKIE), None);
    assert!(request.changes()[0].is_removal());
}

#[test]
fn bad_credentials_do_not_mint() {
    let config = AuthConfig::default();
    let result = auth::attempt_login(&config.users, "demo@example.com", "wrong", config.session_ttl(), Utc::now());
    assert_eq!(result.unwrap_err(), LoginRejected::InvalidCredentials);
}

#[test]
fn logout_then_gate_is_anonymous() {
    let mut jar = CookieJar::new();
    auth::logout(&mut jar);
    let mut next = replay(&jar);
    assert_eq!(auth::authorize(&mut next, Utc::now()), GateDecision::Anonymous);
}
