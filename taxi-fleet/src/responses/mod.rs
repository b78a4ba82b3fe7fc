//! Response helpers shared by handlers and middleware

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// `302 Found` redirect, the status browsers and form posts expect after a
/// successful mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found(pub String);

impl Found {
    /// Redirect to the given location
    pub fn to(location: impl Into<String>) -> Self {
        Self(location.into())
    }
}

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        match HeaderValue::try_from(self.0) {
            Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Build `login_path?next=<path>` for a request that needs a login
#[must_use]
pub fn login_url(login_path: &str, next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) if !next.is_empty() => format!("{login_path}?{query}"),
        _ => login_path.to_string(),
    }
}

/// Only local absolute paths are accepted as post-login targets
///
/// Browsers read `\` as `/`, so backslashes are refused along with
/// scheme-relative `//host` paths and control characters.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|path| {
        path.starts_with('/')
            && !path.starts_with("//")
            && !path.contains('\\')
            && !path.chars().any(char::is_control)
    })
}
