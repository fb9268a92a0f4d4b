/// Property tests for filter selection encodings.
///
/// Any selection with dates in the four-digit-year range survives both the
/// `filters` cookie JSON and the shareable URL query unchanged.
use chrono::NaiveDate;
use proptest::prelude::*;

use timelens::filters::share::to_shareable_url;
use timelens::filters::store::{resolve_initial, selection_from_query};
use timelens::filters::{AgeBracket, FilterSelection, Gender, format_date, parse_date};

fn date() -> impl Strategy<Value = NaiveDate> {
    (1000i32..=9999, 1u32..=12, 1u32..=31)
        .prop_filter_map("valid calendar date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

/// Known brackets, plus arbitrary non-empty text passed through as `Other`.
fn age() -> impl Strategy<Value = AgeBracket> {
    prop_oneof![
        Just(AgeBracket::Youth),
        Just(AgeBracket::Adult),
        "\\PC{1,16}".prop_map(AgeBracket::from),
    ]
}

fn gender() -> impl Strategy<Value = Gender> {
    prop_oneof![
        Just(Gender::Male),
        Just(Gender::Female),
        "\\PC{1,16}".prop_map(Gender::from),
    ]
}

fn selection() -> impl Strategy<Value = FilterSelection> {
    (age(), gender(), date(), date()).prop_map(|(age, gender, start_date, end_date)| FilterSelection {
        age,
        gender,
        start_date,
        end_date,
    })
}

const BASE_URL: &str = "http://localhost:5173/dashboard";

proptest! {
    #[test]
    fn prop_dates_survive_text_format(day in date()) {
        prop_assert_eq!(parse_date(&format_date(day)).unwrap(), day);
    }

    #[test]
    fn prop_cookie_json_round_trips(sel in selection()) {
        let json = sel.to_cookie_json().unwrap();
        prop_assert_eq!(FilterSelection::from_cookie_json(&json).unwrap(), sel);
    }

    #[test]
    fn prop_share_url_resolves_to_same_selection(sel in selection(), other in selection()) {
        let url = to_shareable_url(&sel, BASE_URL).unwrap();
        prop_assert!(url.starts_with(BASE_URL));
        let query = url.split_once('?').map(|(_, q)| q).unwrap();

        // The URL wins over any cookie and any default.
        let cookie = other.to_cookie_json().unwrap();
        prop_assert_eq!(resolve_initial(Some(query), Some(&cookie), &other), sel.clone());
        prop_assert_eq!(selection_from_query(query), Some(sel));
    }

    #[test]
    fn prop_cookie_used_when_url_is_missing(sel in selection(), default in selection()) {
        let cookie = sel.to_cookie_json().unwrap();
        prop_assert_eq!(resolve_initial(None, Some(&cookie), &default), sel);
    }

    #[test]
    fn prop_validate_accepts_only_ordered_ranges(sel in selection()) {
        prop_assert_eq!(sel.validate().is_ok(), sel.start_date <= sel.end_date);
    }
}
