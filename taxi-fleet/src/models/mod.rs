//! Entity store: manufacturers, drivers and cars
//!
//! Each entity is a plain `FromRow` struct with associated async functions
//! that run SQL against the shared [`SqlitePool`](sqlx::SqlitePool).
//!
//! List queries take an optional search term matched as a case-insensitive
//! substring and are paginated through [`Page`].

pub mod car;
pub mod driver;
pub mod manufacturer;

pub use car::{Car, NewCar};
pub use driver::{Driver, DriverProfile, NewDriver};
pub use manufacturer::{Manufacturer, NewManufacturer};

use crate::error::{TaxiError, TaxiResult};

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub number: u32,
    /// Total number of pages (at least 1)
    pub num_pages: u32,
    /// Total number of matching records
    pub total: i64,
}

impl<T> Page<T> {
    /// Whether there is more than one page
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }

    /// Whether a previous page exists
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Whether a next page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Previous page number (only meaningful when [`Self::has_previous`])
    #[must_use]
    pub const fn previous_number(&self) -> u32 {
        self.number.saturating_sub(1)
    }

    /// Next page number (only meaningful when [`Self::has_next`])
    #[must_use]
    pub const fn next_number(&self) -> u32 {
        self.number + 1
    }
}

/// Where a requested page starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub number: u32,
    /// Total number of pages
    pub num_pages: u32,
    /// `LIMIT` for the query
    pub limit: i64,
    /// `OFFSET` for the query
    pub offset: i64,
}

impl PageWindow {
    /// Resolve the `page` query parameter against a result count
    ///
    /// Accepts a positive number or `last`. Anything else, including a
    /// number past the last page, is a 404. An empty result still has page 1.
    pub fn resolve(requested: Option<&str>, total: i64, page_size: u32) -> TaxiResult<Self> {
        let page_size = page_size.max(1);
        let total_u64 = u64::try_from(total.max(0)).unwrap_or(0);
        let num_pages = u32::try_from(total_u64.div_ceil(u64::from(page_size)))
            .unwrap_or(u32::MAX)
            .max(1);

        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| TaxiError::NotFound(format!("Invalid page ({raw})")))?,
        };

        if number == 0 || number > num_pages {
            return Err(TaxiError::NotFound(format!("Invalid page ({number})")));
        }

        Ok(Self {
            number,
            num_pages,
            limit: i64::from(page_size),
            offset: i64::from(number - 1) * i64::from(page_size),
        })
    }

    /// Wrap fetched records into a [`Page`]
    #[must_use]
    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total,
        }
    }
}

/// Normalise a search term: trimmed, `None` when blank
#[must_use]
pub fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|term| !term.is_empty())
}

/// `LIKE` pattern matching `term` as a literal substring (`ESCAPE '\'`)
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_first_page_of_empty_result() {
        let window = PageWindow::resolve(None, 0, 5).unwrap();
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_resolve_middle_and_last_page() {
        let window = PageWindow::resolve(Some("2"), 12, 5).unwrap();
        assert_eq!(window.num_pages, 3);
        assert_eq!(window.offset, 5);
        assert_eq!(window.limit, 5);

        let last = PageWindow::resolve(Some("last"), 12, 5).unwrap();
        assert_eq!(last.number, 3);
        assert_eq!(last.offset, 10);
    }

    #[test]
    fn test_resolve_rejects_bad_pages() {
        assert!(PageWindow::resolve(Some("0"), 12, 5).is_err());
        assert!(PageWindow::resolve(Some("4"), 12, 5).is_err());
        assert!(PageWindow::resolve(Some("abc"), 12, 5).is_err());
    }

    #[test]
    fn test_page_navigation() {
        let page = PageWindow::resolve(Some("2"), 12, 5)
            .unwrap()
            .into_page(vec![1, 2, 3, 4, 5], 12);
        assert!(page.is_paginated());
        assert!(page.has_previous());
        assert!(page.has_next());
        assert_eq!(page.previous_number(), 1);
        assert_eq!(page.next_number(), 3);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Toy"), "%Toy%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(Some("  Toy ")), Some("Toy"));
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(None), None);
    }
}
