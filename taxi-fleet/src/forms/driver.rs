use super::{require, static_errors, FormData, LicenseFormat, ValidationErrors};
use crate::error::TaxiResult;
use crate::models::{Driver, DriverProfile, NewDriver};
use sqlx::SqlitePool;
use validator::Validate;

const MIN_PASSWORD_LENGTH: usize = 8;
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const LICENSE_TAKEN: &str = "Driver with this License number already exists.";

fn check_username(errors: &mut ValidationErrors, username: &str) {
    require(errors, "username", username);
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_license(errors: &mut ValidationErrors, format: &LicenseFormat, license_number: &str) {
    if let Err(message) = format.validate(license_number) {
        errors.add("license_number", message);
    }
}

fn check_password(errors: &mut ValidationErrors, password1: &str, password2: &str) {
    require(errors, "password1", password1);
    require(errors, "password2", password2);

    if !password1.is_empty() && !password2.is_empty() && password1 != password2 {
        errors.add("password2", "The two password fields didn't match.");
        return;
    }

    if password2.is_empty() {
        return;
    }

    if password2.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password2",
            format!(
                "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
            ),
        );
    }
    if password2.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password2", "This password is entirely numeric.");
    }
}

async fn check_license_unique(
    errors: &mut ValidationErrors,
    pool: &SqlitePool,
    license_number: &str,
    instance_id: Option<i64>,
) -> TaxiResult<()> {
    if !errors.has("license_number")
        && !license_number.is_empty()
        && Driver::license_number_taken(pool, license_number, instance_id).await?
    {
        errors.add("license_number", LICENSE_TAKEN);
    }
    Ok(())
}

/// Registration form for a new driver
///
/// Cleaning returns the form itself with trimmed values, so already-clean
/// input comes back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct DriverCreationForm {
    /// Login name
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub username: String,
    /// Password
    pub password1: String,
    /// Password confirmation
    pub password2: String,
    /// Given name
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    /// Family name
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    /// Driving license number
    pub license_number: String,
}

impl DriverCreationForm {
    /// Bind submitted values; passwords are taken verbatim
    #[must_use]
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.text("username"),
            password1: data.raw("password1").unwrap_or_default().to_string(),
            password2: data.raw("password2").unwrap_or_default().to_string(),
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            license_number: data.text("license_number"),
        }
    }

    /// Field checks that need no database
    pub fn clean(&self, license: &LicenseFormat) -> Result<Self, ValidationErrors> {
        let mut errors = static_errors(self);
        check_username(&mut errors, &self.username);
        check_password(&mut errors, &self.password1, &self.password2);
        check_license(&mut errors, license, &self.license_number);

        errors.into_result(self.clone())
    }

    /// Full validation including username and license uniqueness
    pub async fn clean_with_store(
        &self,
        pool: &SqlitePool,
        license: &LicenseFormat,
    ) -> TaxiResult<Result<Self, ValidationErrors>> {
        let mut errors = self.clean(license).err().unwrap_or_default();

        if !errors.has("username")
            && !self.username.is_empty()
            && Driver::username_taken(pool, &self.username).await?
        {
            errors.add("username", USERNAME_TAKEN);
        }
        check_license_unique(&mut errors, pool, &self.license_number, None).await?;

        Ok(errors.into_result(self.clone()))
    }

    /// Values to hand to [`Driver::create_user`]
    #[must_use]
    pub fn into_new_driver(self) -> NewDriver {
        NewDriver {
            username: self.username,
            password: self.password1,
            first_name: self.first_name,
            last_name: self.last_name,
            license_number: self.license_number,
            ..NewDriver::default()
        }
    }

    /// Copy without the passwords, for re-rendering
    #[must_use]
    pub fn without_passwords(&self) -> Self {
        Self {
            password1: String::new(),
            password2: String::new(),
            ..self.clone()
        }
    }
}

/// Form changing only a driver's license number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverLicenseUpdateForm {
    /// New license number
    pub license_number: String,
}

impl DriverLicenseUpdateForm {
    /// Bind submitted values
    #[must_use]
    pub fn from_data(data: &FormData) -> Self {
        Self {
            license_number: data.text("license_number"),
        }
    }

    /// Pre-populate from a driver
    #[must_use]
    pub fn from_driver(driver: &Driver) -> Self {
        Self {
            license_number: driver.license_number.clone(),
        }
    }

    /// Format check
    pub fn clean(&self, license: &LicenseFormat) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_license(&mut errors, license, &self.license_number);
        errors.into_result(self.license_number.clone())
    }

    /// Format and uniqueness check; `driver_id` is the driver being edited
    pub async fn clean_with_store(
        &self,
        pool: &SqlitePool,
        license: &LicenseFormat,
        driver_id: i64,
    ) -> TaxiResult<Result<String, ValidationErrors>> {
        let mut errors = self.clean(license).err().unwrap_or_default();
        check_license_unique(&mut errors, pool, &self.license_number, Some(driver_id)).await?;
        Ok(errors.into_result(self.license_number.clone()))
    }
}

/// Admin change form for an existing driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct DriverChangeForm {
    /// Given name
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    /// Family name
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    /// Contact address, optional
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    /// Driving license number
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub license_number: String,
    /// Staff status
    pub is_staff: bool,
}

impl DriverChangeForm {
    /// Bind submitted values
    #[must_use]
    pub fn from_data(data: &FormData) -> Self {
        let email = data.text("email");
        Self {
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            email: (!email.is_empty()).then_some(email),
            license_number: data.text("license_number"),
            is_staff: data.flag("is_staff"),
        }
    }

    /// Pre-populate from a driver
    #[must_use]
    pub fn from_driver(driver: &Driver) -> Self {
        Self {
            first_name: driver.first_name.clone(),
            last_name: driver.last_name.clone(),
            email: (!driver.email.is_empty()).then(|| driver.email.clone()),
            license_number: driver.license_number.clone(),
            is_staff: driver.is_staff,
        }
    }

    /// Email value for display (empty when unset)
    #[must_use]
    pub fn email_value(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// Static checks plus license uniqueness
    pub async fn clean_with_store(
        &self,
        pool: &SqlitePool,
        driver_id: i64,
    ) -> TaxiResult<Result<DriverProfile, ValidationErrors>> {
        let mut errors = static_errors(self);
        check_license_unique(&mut errors, pool, &self.license_number, Some(driver_id)).await?;

        Ok(errors.into_result(DriverProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone().unwrap_or_default(),
            license_number: self.license_number.clone(),
            is_staff: self.is_staff,
        }))
    }
}
