//! taxi-fleet: server-rendered administration for a taxi service
//!
//! Manufacturers, cars and drivers are kept in `SQLite` and managed through
//! HTML pages rendered with askama. List pages refresh in place through HTMX
//! search boxes; everything works as plain form posts too.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use taxi_fleet::{config::TaxiConfig, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     taxi_fleet::observability::init()?;
//!
//!     let config = TaxiConfig::load()?;
//!     let addr = config.service.bind_address();
//!     let state = AppState::connect(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, taxi_fleet::router(state)).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Layout
//!
//! - [`models`]: entity store over `sqlx`
//! - [`forms`]: form binding and validation
//! - [`views`]: fleet pages, [`admin`]: staff-only admin site
//! - [`auth`] and [`middleware`]: sessions, login, route protection

#![allow(clippy::missing_errors_doc)]

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod responses;
pub mod state;
pub mod template;
pub mod urls;
pub mod views;

#[cfg(test)]
pub mod testing;

use crate::middleware::{AuthMiddleware, CsrfLayer, SessionLayer};
use crate::state::AppState;
use crate::urls::Route;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Largest accepted form body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the application router
///
/// Every page except login and logout requires a logged-in driver; admin
/// pages additionally require staff status. Every POST must carry the
/// session's CSRF token.
pub fn router(state: AppState) -> Router {
    let gate = AuthMiddleware::new(&state);
    let timeout = Duration::from_millis(state.config().service.request_timeout_ms);

    let protected = Router::new()
        .route(Route::Index.pattern(), get(views::index::index))
        .merge(fleet_routes())
        .merge(admin_routes())
        .route_layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            gate.clone().handle(req, next)
        }));

    let public = Router::new()
        .route(
            Route::Login.pattern(),
            get(views::auth::login_page).post(views::auth::login),
        )
        .route(Route::Logout.pattern(), post(views::auth::logout));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CsrfLayer::new(MAX_BODY_BYTES))
        .layer(SessionLayer::new(&state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn fleet_routes() -> Router<AppState> {
    use views::{car, driver, manufacturer};

    Router::new()
        .route(Route::ManufacturerList.pattern(), get(manufacturer::list))
        .route(
            Route::ManufacturerCreate.pattern(),
            get(manufacturer::create_page).post(manufacturer::create),
        )
        .route(
            Route::ManufacturerUpdate(0).pattern(),
            get(manufacturer::update_page).post(manufacturer::update),
        )
        .route(
            Route::ManufacturerDelete(0).pattern(),
            get(manufacturer::delete_page).post(manufacturer::delete),
        )
        .route(Route::CarList.pattern(), get(car::list))
        .route(
            Route::CarCreate.pattern(),
            get(car::create_page).post(car::create),
        )
        .route(Route::CarDetail(0).pattern(), get(car::detail))
        .route(
            Route::CarUpdate(0).pattern(),
            get(car::update_page).post(car::update),
        )
        .route(
            Route::CarDelete(0).pattern(),
            get(car::delete_page).post(car::delete),
        )
        .route(Route::ToggleCarAssign(0).pattern(), post(car::toggle_assign))
        .route(Route::DriverList.pattern(), get(driver::list))
        .route(
            Route::DriverCreate.pattern(),
            get(driver::create_page).post(driver::create),
        )
        .route(Route::DriverDetail(0).pattern(), get(driver::detail))
        .route(
            Route::DriverUpdate(0).pattern(),
            get(driver::update_page).post(driver::update),
        )
        .route(
            Route::DriverDelete(0).pattern(),
            get(driver::delete_page).post(driver::delete),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(Route::AdminIndex.pattern(), get(admin::index))
        .route(
            Route::AdminDriverChangelist.pattern(),
            get(admin::driver_changelist),
        )
        .route(
            Route::AdminDriverAdd.pattern(),
            get(admin::driver_add_page).post(admin::driver_add),
        )
        .route(
            Route::AdminDriverChange(0).pattern(),
            get(admin::driver_change_page).post(admin::driver_change),
        )
        .route(Route::AdminCarChangelist.pattern(), get(admin::car_changelist))
        .route(
            Route::AdminManufacturerChangelist.pattern(),
            get(admin::manufacturer_changelist),
        )
}
