//! Authentication extractors for Axum handlers
//!
//! # Examples
//!
//! ```rust,no_run
//! use taxi_fleet::auth::Authenticated;
//!
//! async fn protected_handler(Authenticated(driver): Authenticated) -> String {
//!     format!("Hello, {}!", driver.username)
//! }
//! ```

use crate::auth::SessionData;
use crate::error::TaxiError;
use crate::models::Driver;
use crate::responses::{login_url, Found};
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};
use std::ops::{Deref, DerefMut};

/// The current request's session
///
/// Changes are persisted by returning the session as part of the response,
/// e.g. `(session, Found::to("/"))`; the session middleware picks the data
/// up from the response extensions.
#[derive(Debug, Clone)]
pub struct Session {
    data: SessionData,
}

impl Deref for Session {
    type Target = SessionData;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AuthenticationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or(AuthenticationError::MissingSession)?;

        Ok(Self { data })
    }
}

impl IntoResponseParts for Session {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self.data);
        Ok(res)
    }
}

/// Logged-in driver extractor for protected routes
///
/// Anonymous requests are redirected to the login page. A session pointing
/// at a deleted or deactivated driver counts as anonymous. Behind
/// [`AuthMiddleware`](crate::middleware::AuthMiddleware) the driver it already
/// loaded is reused.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Driver);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthenticationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(driver) = parts.extensions.get::<Driver>() {
            return Ok(Self(driver.clone()));
        }

        let app_state = AppState::from_ref(state);
        let login_path = &app_state.config().security.login_path;
        let next = parts
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        let redirect = || AuthenticationError::NotAuthenticated(login_url(login_path, next));

        let user_id = parts
            .extensions
            .get::<SessionData>()
            .ok_or(AuthenticationError::MissingSession)?
            .user_id
            .ok_or_else(redirect)?;

        match Driver::find_by_id(app_state.pool(), user_id).await {
            Ok(driver) if driver.is_active => Ok(Self(driver)),
            Ok(_) | Err(TaxiError::NotFound(_)) => Err(redirect()),
            Err(e) => Err(AuthenticationError::Store(e)),
        }
    }
}

/// Logged-in staff driver, for the admin site
///
/// Non-staff drivers get 403.
#[derive(Debug, Clone)]
pub struct StaffUser(pub Driver);

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthenticationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(driver) = Authenticated::from_request_parts(parts, state).await?;

        if !driver.is_staff {
            tracing::warn!(username = %driver.username, "non-staff driver denied admin access");
            return Err(AuthenticationError::NotStaff);
        }

        Ok(Self(driver))
    }
}

/// Authentication errors for extractors
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    /// Session middleware is not installed
    #[error("no session in request extensions")]
    MissingSession,

    /// No driver is logged in; carries the login URL
    #[error("not authenticated")]
    NotAuthenticated(String),

    /// Logged in without staff status
    #[error("staff status required")]
    NotStaff,

    /// Loading the driver failed
    #[error(transparent)]
    Store(TaxiError),
}

impl IntoResponse for AuthenticationError {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated(login_url) => Found(login_url).into_response(),
            Self::NotStaff => TaxiError::Forbidden(
                "You don't have permission to view or edit anything.".into(),
            )
            .into_response(),
            Self::MissingSession => {
                tracing::error!("session extractor used without SessionLayer");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Store(e) => e.into_response(),
        }
    }
}
