use super::{require, static_errors, FormData, ValidationErrors, REQUIRED};
use crate::error::TaxiResult;
use crate::models::{Car, Driver, Manufacturer, NewCar};
use sqlx::SqlitePool;
use validator::Validate;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Create/update form for a car
///
/// `manufacturer` and `drivers` hold the raw submitted ids so an invalid
/// choice can be shown back to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CarForm {
    /// Model name
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub model: String,
    /// Selected manufacturer id
    pub manufacturer: String,
    /// Selected driver ids
    pub drivers: Vec<String>,
}

impl CarForm {
    /// Bind submitted values
    #[must_use]
    pub fn from_data(data: &FormData) -> Self {
        Self {
            model: data.text("model"),
            manufacturer: data.text("manufacturer"),
            drivers: data.all("drivers"),
        }
    }

    /// Pre-populate from an existing car
    #[must_use]
    pub fn from_car(car: &Car, driver_ids: &[i64]) -> Self {
        Self {
            model: car.model.clone(),
            manufacturer: car.manufacturer_id.to_string(),
            drivers: driver_ids.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether the manufacturer option with this id is selected
    #[must_use]
    pub fn manufacturer_selected(&self, id: &i64) -> bool {
        self.manufacturer == id.to_string()
    }

    /// Whether the driver option with this id is selected
    #[must_use]
    pub fn driver_selected(&self, id: &i64) -> bool {
        let id = id.to_string();
        self.drivers.iter().any(|d| *d == id)
    }

    /// Validate against the store and produce the values to persist
    pub async fn clean(&self, pool: &SqlitePool) -> TaxiResult<Result<NewCar, ValidationErrors>> {
        let mut errors = static_errors(self);
        require(&mut errors, "model", &self.model);

        let mut manufacturer_id = 0;
        if self.manufacturer.is_empty() {
            errors.add("manufacturer", REQUIRED);
        } else {
            let valid = match self.manufacturer.parse::<i64>() {
                Ok(id) => Manufacturer::exists(pool, id).await?.then_some(id),
                Err(_) => None,
            };
            match valid {
                Some(id) => manufacturer_id = id,
                None => errors.add("manufacturer", INVALID_CHOICE),
            }
        }

        let mut driver_ids = Vec::with_capacity(self.drivers.len());
        if self.drivers.is_empty() {
            errors.add("drivers", REQUIRED);
        }
        for raw in &self.drivers {
            let valid = match raw.parse::<i64>() {
                Ok(id) => Driver::exists(pool, id).await?.then_some(id),
                Err(_) => None,
            };
            match valid {
                Some(id) if driver_ids.contains(&id) => {}
                Some(id) => driver_ids.push(id),
                None => errors.add(
                    "drivers",
                    format!("Select a valid choice. {raw} is not one of the available choices."),
                ),
            }
        }

        Ok(errors.into_result(NewCar {
            model: self.model.clone(),
            manufacturer_id,
            driver_ids,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDriver, NewManufacturer};
    use crate::testing::{fast_hasher, memory_pool};

    #[tokio::test]
    async fn test_valid_car_form() {
        let pool = memory_pool().await;
        let toyota = Manufacturer::create(&pool, &NewManufacturer::new("Toyota", "Japan"))
            .await
            .unwrap();
        let driver = Driver::create_user(
            &pool,
            &fast_hasher(),
            &NewDriver::new("test_user", "test123", "TES12345"),
        )
        .await
        .unwrap();

        let manufacturer = toyota.id.to_string();
        let driver_id = driver.id.to_string();
        let form = CarForm::from_data(&FormData::from_pairs([
            ("model", "Yaris"),
            ("manufacturer", manufacturer.as_str()),
            ("drivers", driver_id.as_str()),
            ("drivers", driver_id.as_str()),
        ]));

        let new_car = form.clean(&pool).await.unwrap().unwrap();
        assert_eq!(new_car.model, "Yaris");
        assert_eq!(new_car.manufacturer_id, toyota.id);
        assert_eq!(new_car.driver_ids, vec![driver.id]);
        assert!(form.manufacturer_selected(&toyota.id));
        assert!(form.driver_selected(&driver.id));
    }

    #[tokio::test]
    async fn test_invalid_choices() {
        let pool = memory_pool().await;
        let form = CarForm {
            model: String::new(),
            manufacturer: "99".into(),
            drivers: vec!["abc".into()],
        };

        let errors = form.clean(&pool).await.unwrap().unwrap_err();
        assert_eq!(errors.for_field("model"), [REQUIRED]);
        assert_eq!(errors.for_field("manufacturer"), [INVALID_CHOICE]);
        assert_eq!(
            errors.for_field("drivers"),
            ["Select a valid choice. abc is not one of the available choices."]
        );
    }

    #[tokio::test]
    async fn test_drivers_required() {
        let pool = memory_pool().await;
        let errors = CarForm::default().clean(&pool).await.unwrap().unwrap_err();
        assert_eq!(errors.for_field("drivers"), [REQUIRED]);
        assert_eq!(errors.for_field("manufacturer"), [REQUIRED]);
    }
}
