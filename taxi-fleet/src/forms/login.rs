use super::{require, FormData, ValidationErrors};
use crate::error::TaxiResult;
use crate::auth::PasswordHasher;
use crate::models::Driver;
use sqlx::SqlitePool;

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Username/password login form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Login name
    pub username: String,
    /// Password, taken verbatim
    pub password: String,
}

impl LoginForm {
    /// Bind submitted values
    #[must_use]
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.text("username"),
            password: data.raw("password").unwrap_or_default().to_string(),
        }
    }

    /// Check the credentials and return the matching active driver
    pub async fn authenticate(
        &self,
        pool: &SqlitePool,
        hasher: &PasswordHasher,
    ) -> TaxiResult<Result<Driver, ValidationErrors>> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "username", &self.username);
        require(&mut errors, "password", &self.password);
        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        match Driver::authenticate(pool, hasher, &self.username, &self.password).await? {
            Some(driver) => Ok(Ok(driver)),
            None => {
                errors.add_non_field(INVALID_LOGIN);
                Ok(Err(errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED;
    use crate::models::NewDriver;
    use crate::testing::{fast_hasher, memory_pool};

    #[tokio::test]
    async fn test_login_form() {
        let pool = memory_pool().await;
        let hasher = fast_hasher();
        Driver::create_user(&pool, &hasher, &NewDriver::new("test_user", "test123", ""))
            .await
            .unwrap();

        let good = LoginForm::from_data(&FormData::from_pairs([
            ("username", "test_user"),
            ("password", "test123"),
        ]));
        assert_eq!(good.authenticate(&pool, &hasher).await.unwrap().unwrap().username, "test_user");

        let bad = LoginForm {
            password: "test1234".into(),
            ..good
        };
        let errors = bad.authenticate(&pool, &hasher).await.unwrap().unwrap_err();
        assert_eq!(errors.non_field_errors(), [INVALID_LOGIN]);
    }

    #[tokio::test]
    async fn test_login_form_required() {
        let pool = memory_pool().await;
        let errors = LoginForm::default()
            .authenticate(&pool, &fast_hasher())
            .await.unwrap().unwrap_err();
        assert_eq!(errors.for_field("username"), [REQUIRED]);
        assert_eq!(errors.for_field("password"), [REQUIRED]);
    }
}
