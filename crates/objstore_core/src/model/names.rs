//! Identifier rules shared by named components.

use super::component::ComponentError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("identifier regex should compile")
});

/// Returns whether `value` is usable as an internal component name.
pub fn is_valid_name(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

/// Validates an internal name, tagging the error with the component kind.
pub fn validate_name(kind: &'static str, value: &str) -> Result<(), ComponentError> {
    if is_valid_name(value) {
        return Ok(());
    }
    Err(ComponentError::InvalidName {
        kind,
        value: value.to_string(),
    })
}

/// Rejects empty or whitespace-only labels.
pub fn require_label(field: &'static str, value: &str) -> Result<(), ComponentError> {
    if value.trim().is_empty() {
        return Err(ComponentError::InvalidValue {
            field,
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{is_valid_name, validate_name};
    use crate::model::component::ComponentError;

    #[test]
    fn accepts_identifiers() {
        for name in ["sys_title", "_hidden", "Folder.Path", "rx-view2"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_non_identifiers() {
        for name in ["", "2fast", "has space", "tab\tname", "-lead"] {
            assert!(!is_valid_name(name), "{name:?} should be invalid");
        }
        assert_eq!(
            validate_name("search", "my search"),
            Err(ComponentError::InvalidName {
                kind: "search",
                value: "my search".to_string(),
            })
        );
    }
}
