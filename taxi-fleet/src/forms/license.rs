//! Driving license number format

use serde::{Deserialize, Serialize};

/// Fixed-width license number: uppercase letters followed by digits
///
/// The default is three letters and five digits, e.g. `TES12345`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseFormat {
    /// Number of leading uppercase ASCII letters
    pub prefix_letters: usize,
    /// Number of trailing ASCII digits
    pub digits: usize,
}

impl Default for LicenseFormat {
    fn default() -> Self {
        Self {
            prefix_letters: 3,
            digits: 5,
        }
    }
}

impl LicenseFormat {
    /// Total length of a valid number
    #[must_use]
    pub const fn len(&self) -> usize {
        self.prefix_letters + self.digits
    }

    /// Whether the format describes the empty string
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check a license number, reporting the first rule it breaks
    pub fn validate(&self, value: &str) -> Result<(), String> {
        let chars: Vec<char> = value.chars().collect();

        if chars.len() != self.len() {
            return Err(format!(
                "License number should consist of {} characters",
                self.len()
            ));
        }

        let (prefix, suffix) = chars.split_at(self.prefix_letters);

        if !prefix.iter().all(char::is_ascii_uppercase) {
            return Err(format!(
                "First {} characters should be uppercase letters",
                self.prefix_letters
            ));
        }

        if !suffix.iter().all(char::is_ascii_digit) {
            return Err(format!("Last {} characters should be digits", self.digits));
        }

        Ok(())
    }
}
