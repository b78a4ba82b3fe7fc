//! Authentication middleware for protecting routes
//!
//! Every route behind this middleware requires a logged-in, active driver.
//! The driver is loaded once here and placed in the request extensions,
//! where [`Authenticated`](crate::auth::Authenticated) picks it up.
//!
//! # Example
//!
//! ```rust,no_run
//! use taxi_fleet::{config::TaxiConfig, middleware::AuthMiddleware, state::AppState};
//! use axum::{Router, routing::get, middleware};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let state = AppState::connect(TaxiConfig::default()).await?;
//! let gate = AuthMiddleware::new(&state);
//! let app: Router<AppState> = Router::new()
//!     .route("/cars/", get(|| async { "cars" }))
//!     .route_layer(middleware::from_fn(move |req, next| {
//!         gate.clone().handle(req, next)
//!     }));
//! # Ok(())
//! # }
//! ```

use crate::auth::SessionData;
use crate::error::TaxiError;
use crate::models::Driver;
use crate::responses::{login_url, Found};
use crate::state::AppState;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

/// Middleware that requires authentication for routes
///
/// Unauthenticated browser requests are redirected (302) to the login page
/// with the original path in `next`. HTMX requests get 401 with an
/// `HX-Redirect` header instead. A session whose driver was deleted or
/// deactivated is treated as anonymous.
#[derive(Clone, Debug)]
pub struct AuthMiddleware {
    login_path: String,
    pool: SqlitePool,
}

impl AuthMiddleware {
    /// Gate using the state's database and configured login path
    #[must_use]
    pub fn new(state: &AppState) -> Self {
        Self {
            login_path: state.config().security.login_path.clone(),
            pool: state.pool().clone(),
        }
    }

    /// Let the request through only for a logged-in, active driver
    pub async fn handle(
        self,
        mut request: Request,
        next: Next,
    ) -> Result<Response, AuthMiddlewareError> {
        let user_id = request
            .extensions()
            .get::<SessionData>()
            .and_then(|session| session.user_id);

        if let Some(user_id) = user_id {
            match Driver::find_by_id(&self.pool, user_id).await {
                Ok(driver) if driver.is_active => {
                    request.extensions_mut().insert(driver);
                    return Ok(next.run(request).await);
                }
                Ok(_) | Err(TaxiError::NotFound(_)) => {
                    tracing::info!(user_id, "session refers to a missing or inactive driver");
                }
                Err(e) => return Err(AuthMiddlewareError::Store(e)),
            }
        }

        let next_path = request
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_string();
        let target = login_url(&self.login_path, &next_path);

        let is_htmx = request
            .headers()
            .get("HX-Request")
            .and_then(|v| v.to_str().ok())
            == Some("true");

        tracing::debug!(path = %next_path, "unauthenticated request redirected to login");

        if is_htmx {
            Err(AuthMiddlewareError::Unauthorized(target))
        } else {
            Err(AuthMiddlewareError::RedirectToLogin(target))
        }
    }
}

/// Authentication middleware errors
#[derive(Debug)]
pub enum AuthMiddlewareError {
    /// HTMX request without a login; carries the login URL
    Unauthorized(String),
    /// Browser request without a login; carries the login URL
    RedirectToLogin(String),
    /// Loading the session's driver failed
    Store(TaxiError),
}

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(login_url) => (
                StatusCode::UNAUTHORIZED,
                [("HX-Redirect", login_url.as_str())],
                "Unauthorized",
            )
                .into_response(),
            Self::RedirectToLogin(login_url) => Found(login_url).into_response(),
            Self::Store(e) => e.into_response(),
        }
    }
}
