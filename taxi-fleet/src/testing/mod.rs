//! Test helpers shared by the unit tests
//!
//! Every helper works on a private in-memory `SQLite` database with the
//! migrations applied, so tests never share rows.

use crate::auth::{PasswordHashConfig, PasswordHasher};
use crate::config::TaxiConfig;
use crate::state::{AppState, MIGRATOR};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Argon2 parameters cheap enough for tests
#[must_use]
pub fn fast_hash_config() -> PasswordHashConfig {
    PasswordHashConfig {
        memory_cost: 8 * 1024,
        iterations: 1,
        ..PasswordHashConfig::default()
    }
}

/// Default configuration with fast password hashing
#[must_use]
pub fn test_config() -> TaxiConfig {
    let mut config = TaxiConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.security.password_hash = fast_hash_config();
    config.security.secure_cookies = false;
    config
}

/// Password hasher using [`fast_hash_config`]
///
/// # Panics
///
/// Panics if the parameters are rejected by argon2.
#[must_use]
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_config(fast_hash_config()).expect("valid test hash parameters")
}

/// Fresh in-memory database with the schema applied
///
/// A single connection keeps every query on the same memory database.
///
/// # Panics
///
/// Panics if the database cannot be opened or migrated.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    MIGRATOR.run(&pool).await.expect("apply migrations");
    pool
}

/// Application state over a fresh in-memory database
///
/// # Panics
///
/// Panics if the state cannot be built.
pub async fn test_state() -> AppState {
    AppState::with_pool(test_config(), memory_pool().await).expect("build test state")
}
