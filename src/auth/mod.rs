//! Login gate for the dashboard.
//!
//! - [`login`] checks credentials against the configured allow-list and
//!   mints a session token.
//! - [`session`] decodes tokens and decides whether a request may see the
//!   dashboard.

pub mod login;
pub mod session;

pub use login::{LoginRejected, attempt_login};
pub use session::{
    AUTH_COOKIE, GateDecision, Session, SessionUser, authorize, decode_token, is_authorized, logout,
};
