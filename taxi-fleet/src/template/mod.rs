//! Template rendering for full pages and HTMX partials
//!
//! Pages are askama templates extending `base.html`. A page that can be
//! refreshed in place wraps the refreshable region in partial markers:
//!
//! ```html
//! <!-- HTMX_PARTIAL_START -->
//! <table>...</table>
//! <!-- HTMX_PARTIAL_END -->
//! ```
//!
//! [`HxTemplate::render_htmx`] returns only that region when the request
//! came from HTMX, and the full page otherwise.

pub mod helpers;

use crate::auth::{FlashMessage, SessionData};
use crate::error::TaxiResult;
use crate::models::{Driver, Page};
use askama::Template;
use axum::response::Html;

const PARTIAL_START: &str = "<!-- HTMX_PARTIAL_START -->";
const PARTIAL_END: &str = "<!-- HTMX_PARTIAL_END -->";

/// Rendering helpers available on every askama template
pub trait HxTemplate: Template {
    /// Render the full page
    fn render_html(&self) -> TaxiResult<Html<String>> {
        Ok(Html(self.render()?))
    }

    /// Render only the partial region, falling back to the full page
    fn render_partial(&self) -> TaxiResult<Html<String>> {
        let html = self.render()?;
        Ok(Html(
            extract_partial(&html).map_or_else(|| html.clone(), str::to_string),
        ))
    }

    /// Full page for browsers, partial for HTMX requests
    fn render_htmx(&self, is_htmx: bool) -> TaxiResult<Html<String>> {
        if is_htmx {
            self.render_partial()
        } else {
            self.render_html()
        }
    }
}

impl<T: Template> HxTemplate for T {}

/// The content between the partial markers, if both are present
#[must_use]
pub fn extract_partial(html: &str) -> Option<&str> {
    let start = html.find(PARTIAL_START)? + PARTIAL_START.len();
    let end = start + html[start..].find(PARTIAL_END)?;
    Some(html[start..end].trim())
}

/// Values shared by every page layout
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Logged-in username, empty for anonymous pages
    pub username: String,
    /// Logged-in driver id
    pub user_id: i64,
    /// Whether to link the admin site
    pub is_staff: bool,
    /// Flash messages consumed by this render
    pub flashes: Vec<FlashMessage>,
    /// Token for the hidden form field and the HTMX header
    pub csrf_token: String,
}

impl PageContext {
    /// Context for a logged-in driver; takes pending flash messages
    pub fn new(driver: &Driver, session: &mut SessionData) -> Self {
        Self {
            flashes: session.take_flashes(),
            ..Self::fragment(driver, session)
        }
    }

    /// Context for a page that may be served as an HTMX fragment
    ///
    /// Fragments leave out the flash region, so flash messages stay queued
    /// for the next full page.
    pub fn for_request(driver: &Driver, session: &mut SessionData, is_htmx: bool) -> Self {
        if is_htmx {
            Self::fragment(driver, session)
        } else {
            Self::new(driver, session)
        }
    }

    /// Context for pages shown before login
    pub fn anonymous(session: &mut SessionData) -> Self {
        Self {
            flashes: session.take_flashes(),
            csrf_token: session.csrf_token().to_string(),
            ..Self::default()
        }
    }

    fn fragment(driver: &Driver, session: &mut SessionData) -> Self {
        Self {
            username: driver.username.clone(),
            user_id: driver.id,
            is_staff: driver.is_staff,
            flashes: Vec::new(),
            csrf_token: session.csrf_token().to_string(),
        }
    }

    /// Whether someone is logged in
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.username.is_empty()
    }
}

/// Pagination links for a list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Current page
    pub number: u32,
    /// Total pages
    pub num_pages: u32,
    /// Link to the previous page
    pub previous_url: Option<String>,
    /// Link to the next page
    pub next_url: Option<String>,
}

impl Pagination {
    /// Links for `page`, preserving the search term under `param`
    #[must_use]
    pub fn new<T>(page: &Page<T>, path: &str, param: &str, term: &str) -> Self {
        let link = |number: u32| {
            let number = number.to_string();
            helpers::query_url(path, &[(param, term), ("page", number.as_str())])
        };
        Self {
            number: page.number,
            num_pages: page.num_pages,
            previous_url: page.has_previous().then(|| link(page.previous_number())),
            next_url: page.has_next().then(|| link(page.next_number())),
        }
    }

    /// Whether there is more than one page
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

/// One option of a `<select>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Submitted value
    pub value: String,
    /// Display text
    pub label: String,
    /// Pre-selected
    pub selected: bool,
}

impl Choice {
    /// Option for a record id
    pub fn new(id: i64, label: impl std::fmt::Display, selected: bool) -> Self {
        Self {
            value: id.to_string(),
            label: label.to_string(),
            selected,
        }
    }
}
