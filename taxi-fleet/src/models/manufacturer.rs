//! Manufacturer records

use super::{like_pattern, search_term, Page, PageWindow};
use crate::error::{TaxiError, TaxiResult};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// A vehicle maker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Manufacturer {
    /// Primary key
    pub id: i64,
    /// Display name, unique
    pub name: String,
    /// Country of origin
    pub country: String,
}

/// Field values for inserting or updating a manufacturer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewManufacturer {
    /// Display name
    pub name: String,
    /// Country of origin
    pub country: String,
}

impl NewManufacturer {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}

impl std::fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

impl Manufacturer {
    /// Insert a manufacturer
    pub async fn create(pool: &SqlitePool, data: &NewManufacturer) -> TaxiResult<Self> {
        let manufacturer = sqlx::query_as::<_, Self>(
            r"
            INSERT INTO taxi_manufacturer (name, country)
            VALUES (?, ?)
            RETURNING id, name, country
            ",
        )
        .bind(&data.name)
        .bind(&data.country)
        .fetch_one(pool)
        .await?;

        tracing::info!(id = manufacturer.id, name = %manufacturer.name, "manufacturer created");
        Ok(manufacturer)
    }

    /// Find a manufacturer by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> TaxiResult<Self> {
        sqlx::query_as::<_, Self>("SELECT id, name, country FROM taxi_manufacturer WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| TaxiError::not_found("Manufacturer", id))
    }

    /// Whether a manufacturer with this ID exists
    pub async fn exists(pool: &SqlitePool, id: i64) -> TaxiResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM taxi_manufacturer WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }

    /// Every manufacturer, ordered by name (for choice lists)
    pub async fn all(pool: &SqlitePool) -> TaxiResult<Vec<Self>> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT id, name, country FROM taxi_manufacturer ORDER BY name, id",
        )
        .fetch_all(pool)
        .await?)
    }

    /// Number of manufacturers whose name contains `search`
    pub async fn count(pool: &SqlitePool, search: Option<&str>) -> TaxiResult<i64> {
        let pattern = search_term(search).map(like_pattern);
        Ok(sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM taxi_manufacturer
            WHERE (? IS NULL OR name LIKE ? ESCAPE '\')
            ",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await?)
    }

    /// Manufacturers whose name contains `search` (case-insensitive), ordered by name
    pub async fn list(
        pool: &SqlitePool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> TaxiResult<Vec<Self>> {
        let pattern = search_term(search).map(like_pattern);
        Ok(sqlx::query_as::<_, Self>(
            r"
            SELECT id, name, country FROM taxi_manufacturer
            WHERE (? IS NULL OR name LIKE ? ESCAPE '\')
            ORDER BY name, id
            LIMIT ? OFFSET ?
            ",
        )
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

    /// Replace a manufacturer's fields
    pub async fn update(pool: &SqlitePool, id: i64, data: &NewManufacturer) -> TaxiResult<Self> {
        let manufacturer = sqlx::query_as::<_, Self>(
            r"
            UPDATE taxi_manufacturer SET name = ?, country = ?
            WHERE id = ?
            RETURNING id, name, country
            ",
        )
        .bind(&data.name)
        .bind(&data.country)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| TaxiError::not_found("Manufacturer", id))?;

        tracing::info!(id, name = %manufacturer.name, "manufacturer updated");
        Ok(manufacturer)
    }

    /// Delete a manufacturer; its cars go with it
    pub async fn delete(pool: &SqlitePool, id: i64) -> TaxiResult<()> {
        let result = sqlx::query("DELETE FROM taxi_manufacturer WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaxiError::not_found("Manufacturer", id));
        }

        tracing::info!(id, "manufacturer deleted");
        Ok(())
    }

    /// Whether another manufacturer already uses `name`
    pub async fn name_taken(pool: &SqlitePool, name: &str, exclude_id: Option<i64>) -> TaxiResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM taxi_manufacturer WHERE name = ? AND (? IS NULL OR id <> ?)",
        )
        .bind(name)
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
    use crate::testing::memory_pool;

    #[test]
    fn test_manufacturer_string() {
        let manufacturer = Manufacturer {
            id: 1,
            name: "test_manufacturer".into(),
            country: "test_country".into(),
        };
        assert_eq!(manufacturer.to_string(), "test_manufacturer test_country");
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = memory_pool().await;
        let created = Manufacturer::create(&pool, &NewManufacturer::new("Toyota", "Japan"))
            .await
            .unwrap();

        let found = Manufacturer::find_by_id(&pool, created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.to_string(), "Toyota Japan");
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let pool = memory_pool().await;
        let err = Manufacturer::find_by_id(&pool, 999).await.unwrap_err();
        assert!(matches!(err, TaxiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let pool = memory_pool().await;
        for (name, country) in [("Toyota", "Japan"), ("Ford", "USA"), ("toyo tires", "Japan")] {
            Manufacturer::create(&pool, &NewManufacturer::new(name, country))
                .await
                .unwrap();
        }

        let names: Vec<String> = Manufacturer::list(&pool, Some("TOY"), 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Toyota", "toyo tires"]);
        assert_eq!(Manufacturer::count(&pool, Some("toy")).await.unwrap(), 2);
        assert_eq!(Manufacturer::count(&pool, None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let pool = memory_pool().await;
        Manufacturer::create(&pool, &NewManufacturer::new("Ford", "USA"))
            .await
            .unwrap();
        assert_eq!(Manufacturer::count(&pool, Some("%")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_page_orders_by_name() {
        let pool = memory_pool().await;
        for name in ["Volvo", "Audi", "Mazda"] {
            Manufacturer::create(&pool, &NewManufacturer::new(name, "X"))
                .await
                .unwrap();
        }

        let page = Manufacturer::page(&pool, None, Some("2"), 2).await.unwrap();
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Volvo");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let pool = memory_pool().await;
        let created = Manufacturer::create(&pool, &NewManufacturer::new("Old Manufacturer", "USA"))
            .await
            .unwrap();

        let updated = Manufacturer::update(
            &pool,
            created.id,
            &NewManufacturer::new("Updated Manufacturer", "USA"),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Updated Manufacturer");

        Manufacturer::delete(&pool, created.id).await.unwrap();
        assert!(!Manufacturer::exists(&pool, created.id).await.unwrap());
        assert!(Manufacturer::delete(&pool, created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_name_taken_excludes_self() {
        let pool = memory_pool().await;
        let created = Manufacturer::create(&pool, &NewManufacturer::new("BMW", "Germany"))
            .await
            .unwrap();

        assert!(Manufacturer::name_taken(&pool, "BMW", None).await.unwrap());
        assert!(!Manufacturer::name_taken(&pool, "BMW", Some(created.id)).await.unwrap());
        assert!(!Manufacturer::name_taken(&pool, "Audi", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_by_store() {
        let pool = memory_pool().await;
        Manufacturer::create(&pool, &NewManufacturer::new("BMW", "Germany"))
            .await
            .unwrap();
        let duplicate = Manufacturer::create(&pool, &NewManufacturer::new("BMW", "Germany")).await;
        assert!(matches!(duplicate, Err(TaxiError::Database(_))));
    }
}
