//! Shareable URLs encoding a filter selection as query parameters.

use anyhow::{Context, Result};
use url::Url;

use super::FilterSelection;

/// Build `base_url?age=..&gender=..&startDate=..&endDate=..`.
///
/// Any query or fragment already on `base_url` is dropped, so sharing from a
/// page that was itself opened via a shared link does not stack parameters.
pub fn to_shareable_url(selection: &FilterSelection, base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url).with_context(|| format!("invalid base URL '{base_url}'"))?;
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut().extend_pairs(selection.query_pairs());
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::store::resolve_initial;
    use crate::filters::{AgeBracket, Gender};

    #[test]
    fn builds_query_in_field_order() {
        let url = to_shareable_url(&FilterSelection::default(), "http://localhost:5173/dashboard").unwrap();
        assert_eq!(
            url,
            "http://localhost:5173/dashboard?age=15-25&gender=Male&startDate=01-10-2022&endDate=08-10-2022"
        );
    }

    #[test]
    fn encodes_greater_than_sign() {
        let selection = FilterSelection {
            age: AgeBracket::Adult,
            ..FilterSelection::default()
        };
        let url = to_shareable_url(&selection, "http://localhost:5173/dashboard").unwrap();
        assert!(url.contains("age=%3E25"));
    }

    #[test]
    fn replaces_existing_query_and_fragment() {
        let url = to_shareable_url(
            &FilterSelection::default(),
            "http://localhost:5173/dashboard?age=%3E25&x=1#top",
        )
        .unwrap();
        assert!(!url.contains("x=1"));
        assert!(!url.contains('#'));
        assert_eq!(url.matches("age=").count(), 1);
    }

    #[test]
    fn shared_url_resolves_back_to_selection() {
        let selection = FilterSelection {
            age: AgeBracket::Adult,
            gender: Gender::Female,
            ..FilterSelection::default()
        };
        let url = to_shareable_url(&selection, "http://example.test/dashboard").unwrap();
        let query = url.split_once('?').map(|(_, q)| q);

        let resolved = resolve_initial(query, None, &FilterSelection::default());
        assert_eq!(resolved, selection);
    }

    #[test]
    fn rejects_relative_base() {
        assert!(to_shareable_url(&FilterSelection::default(), "/dashboard").is_err());
    }
}
