//! Configuration management for taxi-fleet
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `TAXI_` prefix, `__` between
//!    section and key, e.g. `TAXI_SERVICE__PORT=8080`)
//! 2. The TOML file given on the command line, or `./config.toml`
//! 3. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [service]
//! name = "taxi-fleet"
//! port = 8000
//!
//! [database]
//! url = "sqlite://./taxi.db?mode=rwc"
//!
//! [security]
//! session_max_age_secs = 1209600
//!
//! [pagination]
//! page_size = 5
//!
//! [license]
//! prefix_letters = 3
//! digits = 5
//! ```

use crate::auth::PasswordHashConfig;
use crate::forms::LicenseFormat;
use crate::middleware::SameSite;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TAXI_";

/// HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name used in logs
    pub name: String,

    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "taxi-fleet".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_ms: 10_000,
        }
    }
}

impl ServiceSettings {
    /// `host:port` string suitable for `TcpListener::bind`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLx connection URL
    pub url: String,

    /// Maximum pool size
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://./taxi.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Session maximum age in seconds
    pub session_max_age_secs: u64,

    /// Enable secure cookies (HTTPS only)
    pub secure_cookies: bool,

    /// Cookie SameSite policy
    pub same_site: SameSite,

    /// Where unauthenticated requests are sent
    pub login_path: String,

    /// Argon2 parameters for new password hashes
    pub password_hash: PasswordHashConfig,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            session_max_age_secs: 1_209_600, // two weeks
            secure_cookies: !cfg!(debug_assertions),
            same_site: SameSite::Lax,
            login_path: crate::urls::Route::Login.path(),
            password_hash: PasswordHashConfig::default(),
        }
    }
}

/// List view pagination
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationSettings {
    /// Records per page
    pub page_size: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

/// Complete taxi-fleet configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaxiConfig {
    /// HTTP service settings
    #[serde(default)]
    pub service: ServiceSettings,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Security settings
    #[serde(default)]
    pub security: SecuritySettings,

    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationSettings,

    /// License number format enforced by driver forms
    #[serde(default)]
    pub license: LicenseFormat,
}

impl TaxiConfig {
    /// Load configuration from `./config.toml` (if present) and the environment
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file, then the environment
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    /// The layered provider stack, exposed for inspection in tests
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
