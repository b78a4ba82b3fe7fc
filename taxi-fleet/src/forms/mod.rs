//! Form parsing and validation
//!
//! Forms are built from the raw urlencoded body ([`FormData`]) so that
//! repeated keys such as `drivers=1&drivers=2` survive. Each form keeps the
//! submitted values for re-rendering and has a `clean` step that either
//! yields the data to persist or a [`ValidationErrors`] collection.
//!
//! Static constraints (lengths, email syntax) are declared with
//! [`validator`] derives; rules that need the store (uniqueness, existing
//! choices) run in the async `clean` variants.

mod car;
mod driver;
mod error;
mod license;
mod login;
mod manufacturer;

pub use car::CarForm;
pub use driver::{DriverChangeForm, DriverCreationForm, DriverLicenseUpdateForm};
pub use error::ValidationErrors;
pub use license::LicenseFormat;
pub use login::LoginForm;
pub use manufacturer::ManufacturerForm;

use serde::Deserialize;
use validator::Validate;

/// Message for a missing required value
pub const REQUIRED: &str = "This field is required.";

/// Raw urlencoded form body, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    /// Build from key/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// First value for `key`, untouched
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, trimmed; empty when absent
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.raw(key).map(str::trim).unwrap_or_default().to_string()
    }

    /// Every non-blank value for `key`, trimmed
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Checkbox semantics: present and not `off`/`false`
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.raw(key)
            .is_some_and(|v| !matches!(v.trim(), "" | "off" | "false" | "0"))
    }
}

/// Field-level `validator` errors, or an empty set
fn static_errors<T: Validate>(form: &T) -> ValidationErrors {
    form.validate().err().map(Into::into).unwrap_or_default()
}

/// Record [`REQUIRED`] for a blank value
fn require(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_data_from_urlencoded_repeated_keys() {
        let data: FormData =
            serde_urlencoded::from_str("model=Yaris&drivers=1&drivers=2&drivers=").unwrap();

        assert_eq!(data.text("model"), "Yaris");
        assert_eq!(data.all("drivers"), vec!["1", "2"]);
        assert_eq!(data.text("missing"), "");
    }

    #[test]
    fn test_text_is_trimmed_raw_is_not() {
        let data = FormData::from_pairs([("name", "  Toyota "), ("password1", " pw ")]);
        assert_eq!(data.text("name"), "Toyota");
        assert_eq!(data.raw("password1"), Some(" pw "));
    }

    #[test]
    fn test_flag() {
        let data = FormData::from_pairs([("is_staff", "on"), ("is_active", "false")]);
        assert!(data.flag("is_staff"));
        assert!(!data.flag("is_active"));
        assert!(!data.flag("is_superuser"));
    }
}
