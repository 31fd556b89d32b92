//! Phone composite input: a country selector plus a digits field.
//!
//! The composed value is `"(+<code>) <digits>"`, or the empty string while
//! the digits field is empty. Callers treat the empty string as incomplete.

use once_cell::sync::Lazy;
use regex::Regex;

use super::options::COUNTRY_CODES;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9-]*$").unwrap());
static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\+(\d+(?:-\d+)*)\)").unwrap());

/// Country preselected on a fresh form.
pub const DEFAULT_COUNTRY: &str = "Canada (+1)";

/// Extract the dialing code from a selector label, e.g. `"1-876"` from
/// `"Jamaica (+1-876)"`.
pub fn country_code(label: &str) -> Option<&str> {
    COUNTRY_CODE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneInput {
    country: String,
    digits: String,
}

impl Default for PhoneInput {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            digits: String::new(),
        }
    }
}

impl PhoneInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the input from a previously composed value.
    ///
    /// Unknown or empty values yield the default input.
    pub fn from_value(value: &str) -> Self {
        let Some((prefix, digits)) = value.split_once(' ') else {
            return Self::default();
        };

        let country = COUNTRY_CODES.iter().find(|label| {
            country_code(label).is_some_and(|code| prefix == format!("(+{})", code))
        });

        match country {
            Some(label) if DIGITS.is_match(digits) => Self {
                country: label.to_string(),
                digits: digits.to_string(),
            },
            _ => Self::default(),
        }
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Select a country from the closed list. Returns false for unknown labels.
    pub fn select_country(&mut self, label: &str) -> bool {
        if !COUNTRY_CODES.contains(&label) {
            return false;
        }
        self.country = label.to_string();
        true
    }

    /// Replace the digits field. Values with anything other than digits and
    /// hyphens are rejected and the previous value is kept.
    pub fn input_digits(&mut self, value: &str) -> bool {
        if !DIGITS.is_match(value) {
            return false;
        }
        self.digits = value.to_string();
        true
    }

    /// The composed phone value.
    pub fn value(&self) -> String {
        if self.digits.is_empty() {
            return String::new();
        }
        match country_code(&self.country) {
            Some(code) => format!("(+{}) {}", code, self.digits),
            None => String::new(),
        }
    }
}
