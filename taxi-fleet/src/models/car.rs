//! Cars and their driver assignments

use super::{like_pattern, search_term, Driver, Page, PageWindow};
use crate::error::{TaxiError, TaxiResult};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

const CAR_SELECT: &str = "SELECT c.id, c.model, c.manufacturer_id, m.name AS manufacturer_name \
     FROM taxi_car c JOIN taxi_manufacturer m ON m.id = c.manufacturer_id";

/// A car in the fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Car {
    /// Primary key
    pub id: i64,
    /// Model name
    pub model: String,
    /// Owning manufacturer
    pub manufacturer_id: i64,
    /// Manufacturer name, joined in for display
    pub manufacturer_name: String,
}

/// Field values for creating or updating a car
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCar {
    /// Model name
    pub model: String,
    /// Owning manufacturer
    pub manufacturer_id: i64,
    /// Assigned drivers; replaces the current set on update
    pub driver_ids: Vec<i64>,
}

impl std::fmt::Display for Car {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.model)
    }
}

impl Car {
    /// Insert a car together with its driver links
    pub async fn create(pool: &SqlitePool, data: &NewCar) -> TaxiResult<Self> {
        let mut tx = pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO taxi_car (model, manufacturer_id) VALUES (?, ?) RETURNING id",
        )
        .bind(&data.model)
        .bind(data.manufacturer_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::set_drivers(&mut tx, id, &data.driver_ids).await?;
        tx.commit().await?;

        tracing::info!(id, model = %data.model, drivers = data.driver_ids.len(), "car created");
        Self::find_by_id(pool, id).await
    }

    /// Find a car by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> TaxiResult<Self> {
        sqlx::query_as::<_, Self>(&format!("{CAR_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| TaxiError::not_found("Car", id))
    }

    /// Whether a car with this ID exists
    pub async fn exists(pool: &SqlitePool, id: i64) -> TaxiResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM taxi_car WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }

    /// Number of cars whose model contains `search`
    pub async fn count(pool: &SqlitePool, search: Option<&str>) -> TaxiResult<i64> {
        let pattern = search_term(search).map(like_pattern);
        Ok(sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM taxi_car
            WHERE (? IS NULL OR model LIKE ? ESCAPE '\')
            ",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await?)
    }

    /// Cars whose model contains `search`, ordered by model
    pub async fn list(
        pool: &SqlitePool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> TaxiResult<Vec<Self>> {
        let pattern = search_term(search).map(like_pattern);
        Ok(sqlx::query_as::<_, Self>(&format!(
            r"
            {CAR_SELECT}
            WHERE (? IS NULL OR c.model LIKE ? ESCAPE '\')
            ORDER BY c.model, c.id
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

    /// Admin change-list: model search plus an optional manufacturer filter
    pub async fn admin_search(
        pool: &SqlitePool,
        q: Option<&str>,
        manufacturer_id: Option<i64>,
    ) -> TaxiResult<Vec<Self>> {
        let pattern = search_term(q).map(like_pattern);
        Ok(sqlx::query_as::<_, Self>(&format!(
            r"
            {CAR_SELECT}
            WHERE (? IS NULL OR c.model LIKE ? ESCAPE '\')
              AND (? IS NULL OR c.manufacturer_id = ?)
            ORDER BY c.model, c.id
            "
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(manufacturer_id)
        .bind(manufacturer_id)
        .fetch_all(pool)
        .await?)
    }

    /// Cars assigned to a driver, ordered by model
    pub async fn list_for_driver(pool: &SqlitePool, driver_id: i64) -> TaxiResult<Vec<Self>> {
        Ok(sqlx::query_as::<_, Self>(&format!(
            r"
            {CAR_SELECT}
            JOIN taxi_car_drivers cd ON cd.car_id = c.id
            WHERE cd.driver_id = ?
            ORDER BY c.model, c.id
            "
        ))
        .bind(driver_id)
        .fetch_all(pool)
        .await?)
    }

    /// Drivers assigned to this car, ordered by username
    pub async fn drivers(&self, pool: &SqlitePool) -> TaxiResult<Vec<Driver>> {
        Ok(sqlx::query_as::<_, Driver>(
            r"
            SELECT d.id, d.username, d.password_hash, d.first_name, d.last_name, d.email,
                   d.license_number, d.is_staff, d.is_superuser, d.is_active, d.date_joined
            FROM taxi_driver d
            JOIN taxi_car_drivers cd ON cd.driver_id = d.id
            WHERE cd.car_id = ?
            ORDER BY d.username, d.id
            ",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?)
    }

    /// IDs of the drivers assigned to a car
    pub async fn driver_ids(pool: &SqlitePool, id: i64) -> TaxiResult<Vec<i64>> {
        Ok(sqlx::query_scalar(
            "SELECT driver_id FROM taxi_car_drivers WHERE car_id = ? ORDER BY driver_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?)
    }

    /// Replace the full driver set of a car
    pub async fn set_drivers(
        conn: &mut SqliteConnection,
        id: i64,
        driver_ids: &[i64],
    ) -> TaxiResult<()> {
        sqlx::query("DELETE FROM taxi_car_drivers WHERE car_id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        for driver_id in driver_ids {
            sqlx::query("INSERT OR IGNORE INTO taxi_car_drivers (car_id, driver_id) VALUES (?, ?)")
                .bind(id)
                .bind(driver_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }

    /// Replace a car's fields and driver set
    pub async fn update(pool: &SqlitePool, id: i64, data: &NewCar) -> TaxiResult<Self> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("UPDATE taxi_car SET model = ?, manufacturer_id = ? WHERE id = ?")
            .bind(&data.model)
            .bind(data.manufacturer_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaxiError::not_found("Car", id));
        }

        Self::set_drivers(&mut tx, id, &data.driver_ids).await?;
        tx.commit().await?;

        tracing::info!(id, model = %data.model, "car updated");
        Self::find_by_id(pool, id).await
    }

    /// Assign the driver if absent, unassign if present
    ///
    /// Returns whether the driver is assigned afterwards.
    pub async fn toggle_driver(pool: &SqlitePool, id: i64, driver_id: i64) -> TaxiResult<bool> {
        let mut tx = pool.begin().await?;

        let removed = sqlx::query("DELETE FROM taxi_car_drivers WHERE car_id = ? AND driver_id = ?")
            .bind(id)
            .bind(driver_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO taxi_car_drivers (car_id, driver_id) VALUES (?, ?)")
                .bind(id)
                .bind(driver_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let assigned = !removed;
        tracing::info!(car_id = id, driver_id, assigned, "car assignment toggled");
        Ok(assigned)
    }

    /// Delete a car
    pub async fn delete(pool: &SqlitePool, id: i64) -> TaxiResult<()> {
        let result = sqlx::query("DELETE FROM taxi_car WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaxiError::not_found("Car", id));
        }

        tracing::info!(id, "car deleted");
        Ok(())
    }
}
