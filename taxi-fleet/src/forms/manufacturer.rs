use super::{require, static_errors, FormData, ValidationErrors};
use crate::error::TaxiResult;
use crate::models::{Manufacturer, NewManufacturer};
use sqlx::SqlitePool;
use validator::Validate;

/// Create/update form for a manufacturer
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ManufacturerForm {
    /// Display name
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub name: String,
    /// Country of origin
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub country: String,
}

impl ManufacturerForm {
    /// Bind submitted values
    #[must_use]
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            country: data.text("country"),
        }
    }

    /// Pre-populate from an existing record
    #[must_use]
    pub fn from_manufacturer(manufacturer: &Manufacturer) -> Self {
        Self {
            name: manufacturer.name.clone(),
            country: manufacturer.country.clone(),
        }
    }

    /// Field checks that need no database
    pub fn clean(&self) -> Result<NewManufacturer, ValidationErrors> {
        let mut errors = static_errors(self);
        require(&mut errors, "name", &self.name);
        require(&mut errors, "country", &self.country);

        errors.into_result(NewManufacturer::new(&self.name, &self.country))
    }

    /// Full validation including name uniqueness
    ///
    /// `instance_id` is the manufacturer being edited, if any.
    pub async fn clean_with_store(
        &self,
        pool: &SqlitePool,
        instance_id: Option<i64>,
    ) -> TaxiResult<Result<NewManufacturer, ValidationErrors>> {
        let mut errors = match self.clean() {
            Ok(_) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if !self.name.is_empty() && Manufacturer::name_taken(pool, &self.name, instance_id).await? {
            errors.add("name", "Manufacturer with this Name already exists.");
        }

        Ok(errors.into_result(NewManufacturer::new(&self.name, &self.country)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED;
    use crate::testing::memory_pool;

    #[test]
    fn test_valid_form() {
        let form = ManufacturerForm::from_data(&FormData::from_pairs([
            ("name", " New Manufacturer "),
            ("country", "USA"),
        ]));
        assert_eq!(
            form.clean().unwrap(),
            NewManufacturer::new("New Manufacturer", "USA")
        );
    }

    #[test]
    fn test_required_fields() {
        let errors = ManufacturerForm::default().clean().unwrap_err();
        assert_eq!(errors.for_field("name"), [REQUIRED]);
        assert_eq!(errors.for_field("country"), [REQUIRED]);
    }

    #[test]
    fn test_max_length() {
        let form = ManufacturerForm {
            name: "x".repeat(256),
            country: "USA".into(),
        };
        assert!(form.clean().unwrap_err().has("name"));
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let pool = memory_pool().await;
        let existing = Manufacturer::create(&pool, &NewManufacturer::new("Toyota", "Japan"))
            .await
            .unwrap();

        let form = ManufacturerForm {
            name: "Toyota".into(),
            country: "Japan".into(),
        };
        let errors = form.clean_with_store(&pool, None).await.unwrap().unwrap_err();
        assert!(errors.has("name"));

        assert!(form
            .clean_with_store(&pool, Some(existing.id))
            .await
            .unwrap()
            .is_ok());
    }
}
