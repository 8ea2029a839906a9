//! Section contract and field checks
//!
//! Every table of `config.toml` is a `ConfigSection`. Field checks return a
//! single `ValidationError`; a section gathers them with
//! [`Validator::collect_errors`] so one pass reports every bad field.

use std::fmt::Display;
use std::ops::RangeInclusive;

pub use crate::error::ValidationError;

/// One `[table]` of the config file
pub trait ConfigSection: Default {
    /// All problems with this section, or `Ok` when it is usable
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Overwrites this section with `other`
    fn merge(&mut self, other: Self);

    /// Table name as written in the file
    fn section_name(&self) -> &'static str;
}

/// Field checks shared by the sections
pub struct Validator;

impl Validator {
    pub fn in_range<T>(value: T, range: RangeInclusive<T>, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + Display + Copy,
    {
        if range.contains(&value) {
            return Ok(());
        }
        Err(ValidationError::with_value(
            field,
            format!("must be between {} and {}", range.start(), range.end()),
            value,
        ))
    }

    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        match value.trim() {
            "" => Err(ValidationError::new(field, "must not be empty")),
            _ => Ok(()),
        }
    }

    /// Accepts `http://` and `https://` URLs only
    pub fn http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        let scheme_ok = ["https://", "http://"]
            .iter()
            .any(|scheme| value.starts_with(scheme));
        if scheme_ok {
            Ok(())
        } else {
            Err(ValidationError::with_value(
                field,
                "must start with http:// or https://",
                value,
            ))
        }
    }

    /// Accepts names made of ASCII letters, digits and `_`, not starting with a digit
    pub fn env_var_name(value: &str, field: &str) -> Result<(), ValidationError> {
        let mut chars = value.chars();
        let valid = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(ValidationError::with_value(
                field,
                "must contain only letters, digits and '_' and not start with a digit",
                value,
            ))
        }
    }

    pub fn collect_errors(
        results: impl IntoIterator<Item = Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
