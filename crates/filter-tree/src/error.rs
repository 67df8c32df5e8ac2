//! Error types for filter tree import, validation and store operations.
//!
//! Structural edits and evaluation never fail: an edit that cannot be applied
//! is a no-op and evaluation degrades to a boolean outcome. Only the import
//! boundary and operator parsing report errors.

use thiserror::Error;

/// A specialized Result type for schema validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A specialized Result type for tree import.
pub type ImportResult<T> = Result<T, ImportError>;

/// A specialized Result type for [`TreeStore`](crate::TreeStore) operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A value that does not have the shape of a filter tree.
///
/// Every variant carries the JSON path of the offending value, such as
/// `root.children[2].operator`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing.
    #[error("{path}: missing required field")]
    MissingField {
        /// Path of the missing field.
        path: String,
    },

    /// A field holds a value of the wrong JSON type.
    #[error("{path}: expected {expected}, found {found}")]
    WrongType {
        /// Path of the offending value.
        path: String,
        /// Human-readable expected type.
        expected: &'static str,
        /// JSON type actually found.
        found: &'static str,
    },

    /// A string field holds a value outside its allowed set.
    #[error("{path}: invalid value '{value}' (expected one of: {allowed})")]
    InvalidVariant {
        /// Path of the offending value.
        path: String,
        /// The rejected value.
        value: String,
        /// Comma-separated allowed values.
        allowed: String,
    },

    /// Two items in the same tree share an id.
    #[error("{path}: duplicate id '{id}'")]
    DuplicateId {
        /// Path of the second occurrence.
        path: String,
        /// The repeated id.
        id: String,
    },

    /// Any other constraint violation.
    #[error("{path}: {reason}")]
    Invalid {
        /// Path of the offending value.
        path: String,
        /// Description of the violated constraint.
        reason: String,
    },
}

impl ValidationError {
    /// Creates a missing field error.
    pub fn missing(path: impl Into<String>) -> Self {
        ValidationError::MissingField { path: path.into() }
    }

    /// Creates a wrong type error.
    pub fn wrong_type(path: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        ValidationError::WrongType {
            path: path.into(),
            expected,
            found,
        }
    }

    /// Creates an invalid variant error from the allowed wire names.
    pub fn invalid_variant<'a>(
        path: impl Into<String>,
        value: impl Into<String>,
        allowed: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        ValidationError::InvalidVariant {
            path: path.into(),
            value: value.into(),
            allowed: allowed.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    /// Creates a duplicate id error.
    pub fn duplicate_id(path: impl Into<String>, id: impl Into<String>) -> Self {
        ValidationError::DuplicateId {
            path: path.into(),
            id: id.into(),
        }
    }

    /// Creates a generic constraint violation.
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the JSON path of the offending value.
    pub fn path(&self) -> &str {
        match self {
            ValidationError::MissingField { path }
            | ValidationError::WrongType { path, .. }
            | ValidationError::InvalidVariant { path, .. }
            | ValidationError::DuplicateId { path, .. }
            | ValidationError::Invalid { path, .. } => path,
        }
    }
}

/// Errors that can occur while importing a tree from JSON text.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input is not JSON, or passed validation but failed to deserialize.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is JSON but not a filter tree.
    #[error("invalid filter tree: {0}")]
    Invalid(#[from] ValidationError),
}

/// Errors reported by [`TreeStore`](crate::TreeStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation needed a current tree but none is selected.
    #[error("no filter tree selected")]
    NoCurrentTree,

    /// A tree was created with a blank name.
    #[error("tree name must not be empty")]
    EmptyName,

    /// Import of a tree failed; the store is unchanged.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Serializing the current tree failed.
    #[error("failed to serialize tree: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors parsing operator and field type names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Not `AND` or `OR`.
    #[error("unknown logical operator: {0} (expected AND or OR)")]
    UnknownLogicalOperator(String),

    /// Not one of the twelve comparison operators.
    #[error("unknown comparison operator: {0}")]
    UnknownComparisonOperator(String),

    /// Not one of the six field types.
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),
}

impl ParseError {
    /// Creates an unknown logical operator error.
    pub fn unknown_logical_operator(value: impl Into<String>) -> Self {
        ParseError::UnknownLogicalOperator(value.into())
    }

    /// Creates an unknown comparison operator error.
    pub fn unknown_comparison_operator(value: impl Into<String>) -> Self {
        ParseError::UnknownComparisonOperator(value.into())
    }

    /// Creates an unknown field type error.
    pub fn unknown_field_type(value: impl Into<String>) -> Self {
        ParseError::UnknownFieldType(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_includes_path() {
        let err = ValidationError::wrong_type("root.children[0].enabled", "boolean", "string");
        assert_eq!(
            err.to_string(),
            "root.children[0].enabled: expected boolean, found string"
        );
        assert_eq!(err.path(), "root.children[0].enabled");
    }

    #[test]
    fn test_invalid_variant_lists_allowed_values() {
        let err = ValidationError::invalid_variant("root.operator", "XOR", ["AND", "OR"]);
        assert_eq!(
            err.to_string(),
            "root.operator: invalid value 'XOR' (expected one of: AND, OR)"
        );
    }

    #[test]
    fn test_import_error_wraps_validation() {
        let err: ImportError = ValidationError::missing("name").into();
        assert_eq!(err.to_string(), "invalid filter tree: name: missing required field");
    }

    #[test]
    fn test_store_error_import_is_transparent() {
        let err: StoreError = ImportError::from(ValidationError::missing("root")).into();
        assert_eq!(err.to_string(), "invalid filter tree: root: missing required field");
    }
}
