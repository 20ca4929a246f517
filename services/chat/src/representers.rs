//! Conversion between chat entities and their JSON exchange representation
//!
//! Every entity has an output schema (`*Representation`) and an input schema
//! (`*Input`). Input fields are all optional at the type level so that a
//! missing field is reported as a validation error against its name rather
//! than as a JSON decoding failure. Creation requires the mandatory fields;
//! updates apply only what was supplied.

pub mod message;
pub mod room;
pub mod user;

pub use message::{MessageInput, MessageRepresentation, MessageRepresenter};
pub use room::{RoomInput, RoomRepresentation, RoomRepresenter};
pub use user::{UserInput, UserRepresentation, UserRepresenter};

use serde::{Deserialize, Deserializer};

use crate::{
    error::ValidationErrors,
    validation::{REQUIRED, validate_stored_path},
};

/// Deserialize a field where `null` differs from absent
///
/// Absent stays `None` (via `#[serde(default)]`), `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Check a supplied value, keeping it only when it passes
pub(crate) fn supplied<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: T,
    check: impl FnOnce(&T) -> Result<(), String>,
) -> Option<T> {
    match check(&value) {
        Ok(()) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Check a value that must be present
pub(crate) fn required<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<T>,
    check: impl FnOnce(&T) -> Result<(), String>,
) -> Option<T> {
    match value {
        Some(value) => supplied(errors, field, value, check),
        None => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

/// Normalize a nullable stored media reference
///
/// An empty string clears the reference like `null` does. The outer option
/// is `None` when the field was absent or invalid.
pub(crate) fn stored_path(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Option<String>>,
) -> Option<Option<String>> {
    match value? {
        Some(path) if !path.is_empty() => {
            supplied(errors, field, path, |path| validate_stored_path(path)).map(Some)
        }
        _ => Some(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "nullable")]
        file: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_null_from_absent() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        let null: Probe = serde_json::from_str(r#"{"file":null}"#).unwrap();
        let set: Probe = serde_json::from_str(r#"{"file":"a.png"}"#).unwrap();

        assert_eq!(absent.file, None);
        assert_eq!(null.file, Some(None));
        assert_eq!(set.file, Some(Some("a.png".to_string())));
    }

    #[test]
    fn test_required_reports_missing_field() {
        let mut errors = ValidationErrors::new();
        let value: Option<String> = required(&mut errors, "name", None, |_| Ok(()));

        assert!(value.is_none());
        assert_eq!(errors.field("name"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn test_stored_path_clears_on_empty_string() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            stored_path(&mut errors, "avatar", Some(Some(String::new()))),
            Some(None)
        );
        assert_eq!(stored_path(&mut errors, "avatar", None), None);
        assert_eq!(
            stored_path(&mut errors, "avatar", Some(Some("p".repeat(101)))),
            None
        );
        assert!(errors.field("avatar").is_some());
    }
}
