//! Shared setup for the integration tests

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use sqlx::sqlite::SqlitePoolOptions;
use taxi_fleet::{
    auth::{PasswordHashConfig, SessionId},
    config::TaxiConfig,
    models::{Car, Driver, Manufacturer, NewCar, NewDriver, NewManufacturer},
    state::{AppState, MIGRATOR},
};

/// Password given to every driver created through [`driver`]
pub const PASSWORD: &str = "Sup3r-secret";

/// Header carrying the CSRF token on POSTs
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// CSRF token stored in every session made by [`login_cookie`]
pub const CSRF_TOKEN: &str = "integration-csrf-token";

pub fn csrf_token() -> HeaderValue {
    HeaderValue::from_static(CSRF_TOKEN)
}

/// Configuration with cheap password hashing and plain cookies
pub fn config() -> TaxiConfig {
    let mut config = TaxiConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.security.secure_cookies = false;
    config.security.password_hash = PasswordHashConfig {
        memory_cost: 8 * 1024,
        iterations: 1,
        ..PasswordHashConfig::default()
    };
    config
}

/// State over a fresh, migrated in-memory database
pub async fn state() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    AppState::with_pool(config(), pool).unwrap()
}

/// Test server around the full router
pub fn server(state: &AppState) -> TestServer {
    TestServer::new(taxi_fleet::router(state.clone())).unwrap()
}

/// Regular driver with [`PASSWORD`]
pub async fn driver(state: &AppState, username: &str, license_number: &str) -> Driver {
    let mut data = NewDriver::new(username, PASSWORD, license_number);
    data.first_name = "Test".into();
    data.last_name = username.to_uppercase();
    Driver::create_user(state.pool(), state.hasher(), &data)
        .await
        .unwrap()
}

/// Staff driver with [`PASSWORD`]
pub async fn staff(state: &AppState, username: &str, license_number: &str) -> Driver {
    let data = NewDriver::new(username, PASSWORD, license_number);
    Driver::create_superuser(state.pool(), state.hasher(), &data)
        .await
        .unwrap()
}

pub async fn manufacturer(state: &AppState, name: &str, country: &str) -> Manufacturer {
    Manufacturer::create(state.pool(), &NewManufacturer::new(name, country))
        .await
        .unwrap()
}

pub async fn car(state: &AppState, model: &str, manufacturer_id: i64, driver_ids: &[i64]) -> Car {
    let data = NewCar {
        model: model.into(),
        manufacturer_id,
        driver_ids: driver_ids.to_vec(),
    };
    Car::create(state.pool(), &data).await.unwrap()
}

/// `Cookie` header value for a session logged in as `driver_id`
pub fn login_cookie(state: &AppState, driver_id: i64) -> HeaderValue {
    let id = SessionId::generate();
    let mut data = state.sessions().new_session();
    data.login(driver_id);
    data.csrf_token = Some(CSRF_TOKEN.to_string());
    state.sessions().save(id.clone(), data);
    HeaderValue::from_str(&format!("taxi_session={id}")).unwrap()
}
