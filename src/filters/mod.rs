//! Filter selection: the age bracket, gender and date range that scope both
//! chart queries.
//!
//! Dates always travel as `DD-MM-YYYY` text: in the URL, in the `filters`
//! cookie, and on the wire to the metrics service. Reading and writing go
//! through [`parse_date`] / [`format_date`].
//!
//! Enumerated fields are not validated. An unknown age bracket or gender is
//! carried through unchanged in the `Other` variant.

pub mod share;
pub mod store;

use std::fmt;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `chrono` format string for the fixed `DD-MM-YYYY` representation.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Query parameter / JSON field names, in the order they are emitted.
pub const FIELD_AGE: &str = "age";
pub const FIELD_GENDER: &str = "gender";
pub const FIELD_START_DATE: &str = "startDate";
pub const FIELD_END_DATE: &str = "endDate";

/// Parse a `DD-MM-YYYY` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("expected a DD-MM-YYYY date, got '{raw}'"))
}

/// Format a date as `DD-MM-YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Enumerated fields
// ---------------------------------------------------------------------------

/// Age bracket filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgeBracket {
    /// `15-25`
    Youth,
    /// `>25`
    Adult,
    /// Any other value, passed through as received.
    Other(String),
}

impl AgeBracket {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Youth => "15-25",
            Self::Adult => ">25",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for AgeBracket {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "15-25" => Self::Youth,
            ">25" => Self::Adult,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for AgeBracket {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<AgeBracket> for String {
    fn from(age: AgeBracket) -> Self {
        match age {
            AgeBracket::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gender filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    /// Any other value, passed through as received.
    Other(String),
}

impl Gender {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Gender {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Male" => Self::Male,
            "Female" => Self::Female,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for Gender {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FilterSelection
// ---------------------------------------------------------------------------

/// The current filter selection.
///
/// Serializes to the cookie JSON shape
/// `{"age":"15-25","gender":"Male","startDate":"01-10-2022","endDate":"08-10-2022"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    pub age: AgeBracket,
    pub gender: Gender,
    #[serde(with = "ddmmyyyy")]
    pub start_date: NaiveDate,
    #[serde(with = "ddmmyyyy")]
    pub end_date: NaiveDate,
}

impl Default for FilterSelection {
    /// 15-25, Male, 1–8 October 2022.
    fn default() -> Self {
        Self {
            age: AgeBracket::Youth,
            gender: Gender::Male,
            start_date: NaiveDate::from_ymd_opt(2022, 10, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2022, 10, 8).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl FilterSelection {
    /// Build a selection from raw textual fields, parsing both dates.
    pub fn from_fields(age: &str, gender: &str, start_date: &str, end_date: &str) -> Result<Self> {
        Ok(Self {
            age: AgeBracket::from(age),
            gender: Gender::from(gender),
            start_date: parse_date(start_date).context("invalid start date")?,
            end_date: parse_date(end_date).context("invalid end date")?,
        })
    }

    /// The four fields as query parameters, dates in `DD-MM-YYYY`.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            (FIELD_AGE, self.age.to_string()),
            (FIELD_GENDER, self.gender.to_string()),
            (FIELD_START_DATE, format_date(self.start_date)),
            (FIELD_END_DATE, format_date(self.end_date)),
        ]
    }

    /// Reject a date range whose start lies after its end.
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            anyhow::bail!(
                "start date {} is after end date {}",
                format_date(self.start_date),
                format_date(self.end_date)
            );
        }
        Ok(())
    }

    /// Encode as the JSON payload stored in the `filters` cookie.
    pub fn to_cookie_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to encode filter selection")
    }

    /// Decode the JSON payload stored in the `filters` cookie.
    pub fn from_cookie_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("malformed filters cookie")
    }
}

/// Serde adapter for `DD-MM-YYYY` date strings.
mod ddmmyyyy {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
