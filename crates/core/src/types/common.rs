//! Common traits and serde helpers shared across domain models

use serde::{Deserialize, Deserializer, Serializer};

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Optional text stored as a plain string in library files.
///
/// `None` is written as `""`; `""`, `null` and a missing field all read back
/// as `None`. Library files exchanged with older exports use empty strings
/// for "no image".
pub(crate) mod optional_text {
    use super::*;

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}
