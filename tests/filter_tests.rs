/// Filter store tests.
///
/// Initial-selection precedence (URL, then cookie, then default), cookie
/// persistence and shareable URLs.
use timelens::filters::share::to_shareable_url;
use timelens::filters::store::{self, FILTERS_COOKIE, FilterEdit};
use timelens::filters::{AgeBracket, FilterSelection, Gender, format_date};
use timelens::utils::cookies::CookieJar;

fn custom() -> FilterSelection {
    FilterSelection::from_fields(">25", "Female", "03-10-2022", "05-10-2022").unwrap()
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

#[test]
fn complete_url_wins_over_cookie() {
    let cookie = custom().to_cookie_json().unwrap();
    let query = "endDate=02-10-2022&startDate=01-10-2022&gender=Male&age=15-25";
    let resolved = store::resolve_initial(Some(query), Some(&cookie), &FilterSelection::default());

    assert_eq!(resolved.age, AgeBracket::Youth);
    assert_eq!(format_date(resolved.end_date), "02-10-2022");
}

#[test]
fn partial_url_falls_back_to_cookie() {
    let cookie = custom().to_cookie_json().unwrap();
    let resolved = store::resolve_initial(
        Some("age=15-25&gender=Male&startDate=01-10-2022"),
        Some(&cookie),
        &FilterSelection::default(),
    );
    assert_eq!(resolved, custom());
}

#[test]
fn unparsable_url_date_falls_back_to_cookie() {
    let cookie = custom().to_cookie_json().unwrap();
    let query = "age=15-25&gender=Male&startDate=2022-10-01&endDate=02-10-2022";
    let resolved = store::resolve_initial(Some(query), Some(&cookie), &FilterSelection::default());
    assert_eq!(resolved, custom());
}

#[test]
fn nothing_usable_yields_default() {
    let default = FilterSelection::default();
    assert_eq!(store::resolve_initial(None, None, &default), default);
    assert_eq!(store::resolve_initial(Some(""), Some("{oops"), &default), default);
}

// ---------------------------------------------------------------------------
// Cookie persistence
// ---------------------------------------------------------------------------

#[test]
fn cookie_round_trip_preserves_dates() {
    let mut jar = CookieJar::new();
    store::persist(&custom(), &mut jar).unwrap();

    let raw = jar.get(FILTERS_COOKIE).unwrap();
    assert!(raw.contains(r#""startDate":"03-10-2022""#));

    let header = jar.set_cookie_headers().remove(0);
    assert!(!header.contains("Max-Age"));
    let pair = header.split(';').next().unwrap();
    let reread = CookieJar::from_header(Some(pair));
    assert_eq!(store::resolve_from_jar(None, &reread, &FilterSelection::default()), custom());
}

#[test]
fn edits_accumulate_and_overwrite_cookie() {
    let mut selection = FilterSelection::default();
    let mut jar = CookieJar::new();

    FilterEdit::parse("gender", "Female").unwrap().apply(&mut selection);
    store::persist(&selection, &mut jar).unwrap();
    FilterEdit::parse("age", ">25").unwrap().apply(&mut selection);
    store::persist(&selection, &mut jar).unwrap();

    assert_eq!(jar.changes().len(), 1);
    let stored = FilterSelection::from_cookie_json(jar.get(FILTERS_COOKIE).unwrap()).unwrap();
    assert_eq!(stored.gender, Gender::Female);
    assert_eq!(stored.age, AgeBracket::Adult);
}

// ---------------------------------------------------------------------------
// Share URL
// ---------------------------------------------------------------------------

#[test]
fn share_url_encodes_and_resolves_back() {
    let url = to_shareable_url(&custom(), "http://localhost:5173/dashboard?stale=1#top").unwrap();
    assert_eq!(
        url,
        "http://localhost:5173/dashboard?age=%3E25&gender=Female&startDate=03-10-2022&endDate=05-10-2022"
    );

    let query = url.split_once('?').map(|(_, q)| q);
    let resolved = store::resolve_initial(query, None, &FilterSelection::default());
    assert_eq!(resolved, custom());
}

#[test]
fn share_url_rejects_relative_base() {
    assert!(to_shareable_url(&custom(), "/dashboard").is_err());
}
