//! Application state management
//!
//! Combines configuration, the database pool, the session store and the
//! password hasher into one cheaply cloneable value handed to axum.

use crate::auth::{PasswordHasher, SessionStore};
use crate::config::TaxiConfig;
use crate::error::TaxiResult;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Application state for taxi-fleet
///
/// # Example
///
/// ```rust,no_run
/// use taxi_fleet::{config::TaxiConfig, state::AppState};
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::connect(TaxiConfig::default()).await?;
/// let app = taxi_fleet::router(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppState {
    config: Arc<TaxiConfig>,
    pool: SqlitePool,
    sessions: SessionStore,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Connect to the configured database, apply migrations and build state
    pub async fn connect(config: TaxiConfig) -> TaxiResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        MIGRATOR.run(&pool).await?;
        tracing::info!(url = %config.database.url, "database ready");

        Self::with_pool(config, pool)
    }

    /// Build state around an existing, already migrated pool
    pub fn with_pool(config: TaxiConfig, pool: SqlitePool) -> TaxiResult<Self> {
        let hasher = PasswordHasher::with_config(config.security.password_hash.clone())?;
        let max_age = i64::try_from(config.security.session_max_age_secs).unwrap_or(i64::MAX);
        let sessions = SessionStore::new(chrono::Duration::seconds(max_age));

        Ok(Self {
            config: Arc::new(config),
            pool,
            sessions,
            hasher,
        })
    }

    /// Get configuration reference
    #[must_use]
    pub fn config(&self) -> &TaxiConfig {
        &self.config
    }

    /// Database pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Session store
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Password hasher configured from security settings
    #[must_use]
    pub const fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}
