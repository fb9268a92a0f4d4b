//! Filter store: resolves the initial selection and persists edits.
//!
//! Initial resolution is a pure function of the request's query string, the
//! `filters` cookie and a default, so the precedence rule is testable without
//! touching a browser:
//!
//! 1. all four URL parameters present (and both dates parse)
//! 2. a `filters` cookie holding well-formed JSON
//! 3. the default selection

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::{
    AgeBracket, FIELD_AGE, FIELD_END_DATE, FIELD_GENDER, FIELD_START_DATE, FilterSelection, Gender,
    parse_date,
};
use crate::utils::cookies::{Cookie, CookieJar};

/// Name of the cookie holding the persisted selection.
pub const FILTERS_COOKIE: &str = "filters";

// ---------------------------------------------------------------------------
// Initial resolution
// ---------------------------------------------------------------------------

/// Resolve the initial selection from URL query, cookie value and default.
///
/// `url_query` is the raw query string without the leading `?`.
pub fn resolve_initial(
    url_query: Option<&str>,
    cookie_value: Option<&str>,
    default: &FilterSelection,
) -> FilterSelection {
    if let Some(selection) = url_query.and_then(selection_from_query) {
        return selection;
    }

    if let Some(selection) = cookie_value.and_then(|raw| FilterSelection::from_cookie_json(raw).ok()) {
        return selection;
    }

    default.clone()
}

/// Convenience wrapper over [`resolve_initial`] that reads the cookie from a jar.
pub fn resolve_from_jar(url_query: Option<&str>, jar: &CookieJar, default: &FilterSelection) -> FilterSelection {
    resolve_initial(url_query, jar.get(FILTERS_COOKIE), default)
}

/// Extract a complete selection from a query string.
///
/// Returns `None` unless all four parameters are present and non-empty and
/// both dates parse. Parameter order does not matter; a repeated parameter
/// keeps its first value.
pub fn selection_from_query(query: &str) -> Option<FilterSelection> {
    let mut age = None;
    let mut gender = None;
    let mut start = None;
    let mut end = None;

    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        if value.is_empty() {
            continue;
        }
        let slot = match key.as_ref() {
            FIELD_AGE => &mut age,
            FIELD_GENDER => &mut gender,
            FIELD_START_DATE => &mut start,
            FIELD_END_DATE => &mut end,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    FilterSelection::from_fields(&age?, &gender?, &start?, &end?).ok()
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Write the whole selection to the `filters` cookie, overwriting any prior
/// value. The cookie carries no expiry.
pub fn persist(selection: &FilterSelection, jar: &mut CookieJar) -> Result<()> {
    let json = selection.to_cookie_json()?;
    jar.set(Cookie::session(FILTERS_COOKIE, json));
    Ok(())
}

// ---------------------------------------------------------------------------
// Field edits
// ---------------------------------------------------------------------------

/// A single user edit to one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Age(AgeBracket),
    Gender(Gender),
    StartDate(NaiveDate),
    EndDate(NaiveDate),
}

impl FilterEdit {
    /// Parse a textual `(field, value)` edit. Field names match the query
    /// parameter names; dates are `DD-MM-YYYY`.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        match field {
            FIELD_AGE => Ok(Self::Age(AgeBracket::from(value))),
            FIELD_GENDER => Ok(Self::Gender(Gender::from(value))),
            FIELD_START_DATE => Ok(Self::StartDate(
                parse_date(value).context("invalid start date")?,
            )),
            FIELD_END_DATE => Ok(Self::EndDate(parse_date(value).context("invalid end date")?)),
            other => anyhow::bail!("unknown filter field '{other}'"),
        }
    }

    /// Apply the edit to a selection in place.
    pub fn apply(self, selection: &mut FilterSelection) {
        match self {
            Self::Age(age) => selection.age = age,
            Self::Gender(gender) => selection.gender = gender,
            Self::StartDate(date) => selection.start_date = date,
            Self::EndDate(date) => selection.end_date = date,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
