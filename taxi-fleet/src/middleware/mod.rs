//! Middleware layers for taxi-fleet
//!
//! - Session management (cookie-based sessions backed by [`crate::auth::SessionStore`])
//! - CSRF token checks on state-changing requests
//! - Authentication (route protection)

pub mod auth;
pub mod csrf;
pub mod session;

pub use auth::{AuthMiddleware, AuthMiddlewareError};
pub use csrf::{CsrfConfig, CsrfLayer, CsrfMiddleware, CSRF_FORM_FIELD, CSRF_HEADER_NAME};
pub use session::{SameSite, SessionConfig, SessionLayer, SessionMiddleware, SESSION_COOKIE_NAME};
