//! Driver accounts
//!
//! A driver is both a user who can log in and a person who can be assigned
//! to cars. Passwords are stored as Argon2id PHC strings produced by
//! [`PasswordHasher`].

use super::{like_pattern, search_term, Car, Page, PageWindow};
use crate::auth::{verify_password, PasswordHasher};
use crate::error::{TaxiError, TaxiResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

const DRIVER_COLUMNS: &str = "id, username, password_hash, first_name, last_name, email, \
     license_number, is_staff, is_superuser, is_active, date_joined";

/// A user account that can drive cars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Driver {
    /// Primary key
    pub id: i64,
    /// Login name, unique
    pub username: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact address
    pub email: String,
    /// Driving license number, unique when set
    pub license_number: String,
    /// May use the admin site
    pub is_staff: bool,
    /// Has every permission
    pub is_superuser: bool,
    /// Inactive drivers cannot log in
    pub is_active: bool,
    /// Account creation time
    pub date_joined: DateTime<Utc>,
}

/// Field values for creating a driver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDriver {
    /// Login name
    pub username: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact address
    pub email: String,
    /// Driving license number
    pub license_number: String,
    /// May use the admin site
    pub is_staff: bool,
}

impl NewDriver {
    /// Driver with just credentials and a license number
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        license_number: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            license_number: license_number.into(),
            ..Self::default()
        }
    }
}

/// Fields editable from the admin change form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverProfile {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact address
    pub email: String,
    /// Driving license number
    pub license_number: String,
    /// May use the admin site
    pub is_staff: bool,
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}

impl Driver {
    /// Create a driver, hashing the password
    pub async fn create_user(
        pool: &SqlitePool,
        hasher: &PasswordHasher,
        data: &NewDriver,
    ) -> TaxiResult<Self> {
        Self::insert(pool, hasher, data, false).await
    }

    /// Create a staff superuser
    pub async fn create_superuser(
        pool: &SqlitePool,
        hasher: &PasswordHasher,
        data: &NewDriver,
    ) -> TaxiResult<Self> {
        let data = NewDriver {
            is_staff: true,
            ..data.clone()
        };
        Self::insert(pool, hasher, &data, true).await
    }

    async fn insert(
        pool: &SqlitePool,
        hasher: &PasswordHasher,
        data: &NewDriver,
        is_superuser: bool,
    ) -> TaxiResult<Self> {
        let password_hash = hasher.hash(&data.password)?;

        let driver = sqlx::query_as::<_, Self>(&format!(
            r"
            INSERT INTO taxi_driver
                (username, password_hash, first_name, last_name, email,
                 license_number, is_staff, is_superuser, is_active, date_joined)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            RETURNING {DRIVER_COLUMNS}
            "
        ))
        .bind(&data.username)
        .bind(&password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.license_number)
        .bind(data.is_staff)
        .bind(is_superuser)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        tracing::info!(id = driver.id, username = %driver.username, is_superuser, "driver created");
        Ok(driver)
    }

    /// Find a driver by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> TaxiResult<Self> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM taxi_driver WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| TaxiError::not_found("Driver", id))
    }

    /// Find a driver by exact username
    pub async fn find_by_username(pool: &SqlitePool, username: &str) -> TaxiResult<Option<Self>> {
        Ok(sqlx::query_as::<_, Self>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM taxi_driver WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?)
    }

    /// Whether a driver with this ID exists
    pub async fn exists(pool: &SqlitePool, id: i64) -> TaxiResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM taxi_driver WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }

    /// Check a plaintext password against the stored hash
    pub fn check_password(&self, password: &str) -> TaxiResult<bool> {
        Ok(verify_password(password, &self.password_hash)?)
    }

    /// Look up an active driver by credentials
    ///
    /// Returns `None` for an unknown username, a wrong password or an
    /// inactive account. An unknown username still pays for one password
    /// hash, so response time does not reveal which usernames exist.
    pub async fn authenticate(
        pool: &SqlitePool,
        hasher: &PasswordHasher,
        username: &str,
        password: &str,
    ) -> TaxiResult<Option<Self>> {
        let Some(driver) = Self::find_by_username(pool, username).await? else {
            hasher.hash(password)?;
            tracing::debug!(username, "authentication failed: unknown username");
            return Ok(None);
        };

        if !driver.check_password(password)? || !driver.is_active {
            tracing::debug!(username, "authentication failed");
            return Ok(None);
        }

        Ok(Some(driver))
    }

    /// Every driver, ordered by username (for choice lists)
    pub async fn all(pool: &SqlitePool) -> TaxiResult<Vec<Self>> {
        Ok(sqlx::query_as::<_, Self>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM taxi_driver ORDER BY username, id"
        ))
        .fetch_all(pool)
        .await?)
    }

    /// Number of drivers whose username contains `search`
    pub async fn count(pool: &SqlitePool, search: Option<&str>) -> TaxiResult<i64> {
        let pattern = search_term(search).map(like_pattern);
        Ok(sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM taxi_driver
            WHERE (? IS NULL OR username LIKE ? ESCAPE '\')
            ",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await?)
    }

    /// Drivers whose username contains `search`, ordered by username
    pub async fn list(
        pool: &SqlitePool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> TaxiResult<Vec<Self>> {
        let pattern = search_term(search).map(like_pattern);
        Ok(sqlx::query_as::<_, Self>(&format!(
            r"
            SELECT {DRIVER_COLUMNS} FROM taxi_driver
            WHERE (? IS NULL OR username LIKE ? ESCAPE '\')
            ORDER BY username, id
            LIMIT ? OFFSET ?
            "
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?)
    }

    /// One page of the filtered list
    pub async fn page(
        pool: &SqlitePool,
        search: Option<&str>,
        requested: Option<&str>,
        page_size: u32,
    ) -> TaxiResult<Page<Self>> {
        let total = Self::count(pool, search).await?;
        let window = PageWindow::resolve(requested, total, page_size)?;
        let items = Self::list(pool, search, window.limit, window.offset).await?;
        Ok(window.into_page(items, total))
    }

    /// Admin search: `q` matches username, names, email or license number
    pub async fn admin_search(pool: &SqlitePool, q: Option<&str>) -> TaxiResult<Vec<Self>> {
        let pattern = search_term(q).map(like_pattern);
        Ok(sqlx::query_as::<_, Self>(&format!(
            r"
            SELECT {DRIVER_COLUMNS} FROM taxi_driver
            WHERE (?1 IS NULL
                   OR username LIKE ?1 ESCAPE '\'
                   OR first_name LIKE ?1 ESCAPE '\'
                   OR last_name LIKE ?1 ESCAPE '\'
                   OR email LIKE ?1 ESCAPE '\'
                   OR license_number LIKE ?1 ESCAPE '\')
            ORDER BY username, id
            "
        ))
        .bind(&pattern)
        .fetch_all(pool)
        .await?)
    }

    /// Cars this driver is assigned to, ordered by model
    pub async fn cars(&self, pool: &SqlitePool) -> TaxiResult<Vec<Car>> {
        Car::list_for_driver(pool, self.id).await
    }

    /// Change the license number
    pub async fn update_license_number(
        pool: &SqlitePool,
        id: i64,
        license_number: &str,
    ) -> TaxiResult<Self> {
        let driver = sqlx::query_as::<_, Self>(&format!(
            "UPDATE taxi_driver SET license_number = ? WHERE id = ? RETURNING {DRIVER_COLUMNS}"
        ))
        .bind(license_number)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| TaxiError::not_found("Driver", id))?;

        tracing::info!(id, license_number, "driver license number updated");
        Ok(driver)
    }

    /// Save the admin-editable fields
    pub async fn update_profile(
        pool: &SqlitePool,
        id: i64,
        profile: &DriverProfile,
    ) -> TaxiResult<Self> {
        let driver = sqlx::query_as::<_, Self>(&format!(
            r"
            UPDATE taxi_driver
            SET first_name = ?, last_name = ?, email = ?, license_number = ?, is_staff = ?
            WHERE id = ?
            RETURNING {DRIVER_COLUMNS}
            "
        ))
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.license_number)
        .bind(profile.is_staff)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| TaxiError::not_found("Driver", id))?;

        tracing::info!(id, "driver profile updated");
        Ok(driver)
    }

    /// Delete a driver; car assignments go with it
    pub async fn delete(pool: &SqlitePool, id: i64) -> TaxiResult<()> {
        let result = sqlx::query("DELETE FROM taxi_driver WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaxiError::not_found("Driver", id));
        }

        tracing::info!(id, "driver deleted");
        Ok(())
    }

    /// Whether `username` is already registered
    pub async fn username_taken(pool: &SqlitePool, username: &str) -> TaxiResult<bool> {
        Ok(Self::find_by_username(pool, username).await?.is_some())
    }

    /// Whether another driver already holds `license_number`
    pub async fn license_number_taken(
        pool: &SqlitePool,
        license_number: &str,
        exclude_id: Option<i64>,
    ) -> TaxiResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM taxi_driver WHERE license_number = ? AND (? IS NULL OR id <> ?)",
        )
        .bind(license_number)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_hasher, memory_pool};

    fn driver(username: &str, first: &str, last: &str) -> Driver {
        Driver {
            id: 1,
            username: username.into(),
            password_hash: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            email: String::new(),
            license_number: "ABC12345".into(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_driver_string() {
        let driver = driver("test", "test_first", "test_last");
        assert_eq!(driver.to_string(), "test (test_first test_last)");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let mut driver = driver("test", "a", "b");
        driver.password_hash = "$argon2id$secret".into();
        let json = serde_json::to_string(&driver).unwrap();
        assert!(!json.contains("argon2id"));
    }

    #[tokio::test]
    async fn test_create_driver_with_license() {
        let pool = memory_pool().await;
        let hasher = fast_hasher();

        let created = Driver::create_user(
            &pool,
            &hasher,
            &NewDriver::new("test", "test12345", "TES12345"),
        )
        .await
        .unwrap();

        let stored = Driver::find_by_id(&pool, created.id).await.unwrap();
        assert_eq!(stored.username, "test");
        assert_eq!(stored.license_number, "TES12345");
        assert!(stored.check_password("test12345").unwrap());
        assert!(!stored.check_password("wrong").unwrap());
        assert!(!stored.is_staff);
    }

    #[tokio::test]
    async fn test_create_superuser_sets_flags() {
        let pool = memory_pool().await;
        let admin = Driver::create_superuser(
            &pool,
            &fast_hasher(),
            &NewDriver::new("admin", "testadmin", "ADM12345"),
        )
        .await
        .unwrap();

        assert!(admin.is_staff);
        assert!(admin.is_superuser);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let pool = memory_pool().await;
        let hasher = fast_hasher();
        Driver::create_user(&pool, &hasher, &NewDriver::new("bob", "s3cret-pw", "BOB12345"))
            .await
            .unwrap();

        assert!(Driver::authenticate(&pool, &hasher, "bob", "s3cret-pw").await.unwrap().is_some());
        assert!(Driver::authenticate(&pool, &hasher, "bob", "nope").await.unwrap().is_none());
        assert!(Driver::authenticate(&pool, &hasher, "alice", "s3cret-pw")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive_driver() {
        let pool = memory_pool().await;
        let hasher = fast_hasher();
        let driver = Driver::create_user(&pool, &hasher, &NewDriver::new("eve", "pw-eveeve", ""))
            .await
            .unwrap();
        sqlx::query("UPDATE taxi_driver SET is_active = 0 WHERE id = ?")
            .bind(driver.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(Driver::authenticate(&pool, &hasher, "eve", "pw-eveeve").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_license_number_unique_when_set() {
        let pool = memory_pool().await;
        let hasher = fast_hasher();
        let first = Driver::create_user(&pool, &hasher, &NewDriver::new("a", "pw-aaaaaa", "AAA11111"))
            .await
            .unwrap();

        let duplicate =
            Driver::create_user(&pool, &hasher, &NewDriver::new("b", "pw-bbbbbb", "AAA11111")).await;
        assert!(matches!(duplicate, Err(TaxiError::Database(_))));

        Driver::create_user(&pool, &hasher, &NewDriver::new("c", "pw-cccccc", ""))
            .await
            .unwrap();
        Driver::create_user(&pool, &hasher, &NewDriver::new("d", "pw-dddddd", ""))
            .await
            .unwrap();

        assert!(Driver::license_number_taken(&pool, "AAA11111", None).await.unwrap());
        assert!(!Driver::license_number_taken(&pool, "AAA11111", Some(first.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_license_number() {
        let pool = memory_pool().await;
        let created =
            Driver::create_user(&pool, &fast_hasher(), &NewDriver::new("x", "pw-xxxxxx", "XXX11111"))
                .await
                .unwrap();

        let updated = Driver::update_license_number(&pool, created.id, "YYY22222")
            .await
            .unwrap();
        assert_eq!(updated.license_number, "YYY22222");

        let missing = Driver::update_license_number(&pool, 999, "ZZZ33333").await;
        assert!(matches!(missing, Err(TaxiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_by_username() {
        let pool = memory_pool().await;
        let hasher = fast_hasher();
        for (name, license) in [("john", "JOH11111"), ("johnny", "JOH22222"), ("mary", "MAR11111")] {
            Driver::create_user(&pool, &hasher, &NewDriver::new(name, "pw-123456", license))
                .await
                .unwrap();
        }

        let page = Driver::page(&pool, Some("JOHN"), None, 5).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|d| d.username.as_str()).collect();
        assert_eq!(names, vec!["john", "johnny"]);

        let admin = Driver::admin_search(&pool, Some("MAR1")).await.unwrap();
        assert_eq!(admin.len(), 1);
        assert_eq!(admin[0].username, "mary");
    }

    #[tokio::test]
    async fn test_update_profile_and_delete() {
        let pool = memory_pool().await;
        let created =
            Driver::create_user(&pool, &fast_hasher(), &NewDriver::new("p", "pw-pppppp", "PPP11111"))
                .await
                .unwrap();

        let profile = DriverProfile {
            first_name: "Pat".into(),
            last_name: "Smith".into(),
            email: "pat@example.com".into(),
            license_number: "PPP22222".into(),
            is_staff: true,
        };
        let updated = Driver::update_profile(&pool, created.id, &profile).await.unwrap();
        assert_eq!(updated.to_string(), "p (Pat Smith)");
        assert!(updated.is_staff);

        Driver::delete(&pool, created.id).await.unwrap();
        assert!(!Driver::exists(&pool, created.id).await.unwrap());
    }
}
