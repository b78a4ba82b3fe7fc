//! Helpers for building links and HTMX attributes in page contexts
//!
//! ```rust
//! use taxi_fleet::template::helpers::{hx_get, query_url};
//!
//! let url = query_url("/cars/", &[("model", "Cor"), ("page", "2")]);
//! assert_eq!(url, "/cars/?model=Cor&page=2");
//!
//! let attrs = hx_get("/cars/", "#car-table", "innerHTML");
//! assert!(attrs.contains(r##"hx-target="#car-table""##));
//! ```

/// `path?k=v&...` with blank values left out
#[must_use]
pub fn query_url(path: &str, params: &[(&str, &str)]) -> String {
    let present: Vec<(&str, &str)> = params
        .iter()
        .copied()
        .filter(|(_, value)| !value.is_empty())
        .collect();

    match serde_urlencoded::to_string(&present) {
        Ok(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

/// Generate hx-get attribute with target and swap
#[must_use]
pub fn hx_get(url: &str, target: &str, swap: &str) -> String {
    format!(r#"hx-get="{url}" hx-target="{target}" hx-swap="{swap}""#)
}

/// Generate hx-trigger attribute
#[must_use]
pub fn hx_trigger(trigger: &str) -> String {
    format!(r#"hx-trigger="{trigger}""#)
}

/// Attributes for a search box that refreshes a list table as the user types
///
/// The request carries the input's own `name`, so the list view sees the
/// same query parameter as a normal form submit.
#[must_use]
pub fn live_search(url: &str, target: &str) -> String {
    format!(
        "{} {} hx-push-url=\"true\"",
        hx_get(url, target, "innerHTML"),
        hx_trigger("keyup changed delay:300ms, search")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_skips_blank_values() {
        assert_eq!(query_url("/drivers/", &[("username", ""), ("page", "2")]), "/drivers/?page=2");
        assert_eq!(query_url("/drivers/", &[("username", "")]), "/drivers/");
    }

    #[test]
    fn test_query_url_encodes() {
        assert_eq!(
            query_url("/manufacturers/", &[("name", "Rolls Royce&Co")]),
            "/manufacturers/?name=Rolls+Royce%26Co"
        );
    }

    #[test]
    fn test_hx_attributes() {
        assert_eq!(
            hx_get("/cars/", "#list", "innerHTML"),
            r##"hx-get="/cars/" hx-target="#list" hx-swap="innerHTML""##
        );
        assert_eq!(hx_trigger("click"), r#"hx-trigger="click""#);
        assert!(live_search("/cars/", "#car-table").contains("delay:300ms"));
    }
}
