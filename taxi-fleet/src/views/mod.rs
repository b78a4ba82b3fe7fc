//! Request handlers for the fleet pages
//!
//! Every handler except the login pages sits behind
//! [`AuthMiddleware`](crate::middleware::AuthMiddleware) and additionally
//! extracts the [`Authenticated`](crate::auth::Authenticated) driver for the
//! page header.
//!
//! Mutating handlers follow one pattern: bind the form from the raw body,
//! clean it, and either persist and answer `302 Found` or re-render the form
//! with its errors and status 200.

pub mod auth;
pub mod car;
pub mod driver;
pub mod index;
pub mod manufacturer;

use crate::template::PageContext;
use askama::Template;

/// Shared delete confirmation page
#[derive(Template)]
#[template(path = "taxi/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Entity kind shown in the heading
    pub kind: &'static str,
    /// Display string of the record
    pub object: String,
    /// Form target
    pub action: String,
    /// Where "cancel" goes
    pub cancel_url: String,
}
