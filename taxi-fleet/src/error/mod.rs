//! Error types and error handling
//!
//! [`TaxiError`] covers failures that abort a request. Form validation
//! problems are not errors in this sense: they are collected in
//! [`crate::forms::ValidationErrors`] and rendered inline with the form.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum TaxiError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad request error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Password hashing or verification error
    #[error("Password error: {0}")]
    Password(#[from] crate::auth::PasswordError),

    /// Session value could not be stored
    #[error("Session error: {0}")]
    Session(#[from] crate::auth::SessionError),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not Found (404)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl TaxiError {
    /// Shorthand for a missing record of the given kind
    #[must_use]
    pub fn not_found(kind: &str, id: i64) -> Self {
        Self::NotFound(format!("{kind} with id {id} does not exist"))
    }

    /// HTTP status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_)
            | Self::Database(_)
            | Self::Migration(_)
            | Self::Password(_)
            | Self::Session(_)
            | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TaxiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let title = status.canonical_reason().unwrap_or("Error");

        let detail = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            String::new()
        } else {
            tracing::debug!(error = %self, "request rejected");
            format!("<p>{}</p>", html_escape(&self.to_string()))
        };

        let body = format!(
            "<!DOCTYPE html><html><head><title>{title}</title></head>\
             <body><h1>{} {title}</h1>{detail}</body></html>",
            status.as_u16()
        );

        (status, Html(body)).into_response()
    }
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Result alias used by handlers and the store
pub type TaxiResult<T> = Result<T, TaxiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            TaxiError::not_found("Car", 7).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TaxiError::Forbidden("staff only".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            TaxiError::Config("bad port".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = TaxiError::not_found("Manufacturer", 3);
        assert_eq!(
            err.to_string(),
            "Not found: Manufacturer with id 3 does not exist"
        );
    }

    #[test]
    fn test_into_response_escapes_detail() {
        let response = TaxiError::BadRequest("<script>".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
    }
}
