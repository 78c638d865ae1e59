//! Error types for mapping between records and wire values

use std::fmt;
use thiserror::Error;

/// Which of the two mapper registries an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Parameter,
    Result,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::Parameter => write!(f, "parameter"),
            RegistryKind::Result => write!(f, "result"),
        }
    }
}

/// Mapping errors raised while encoding parameters or decoding rows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapError {
    #[error("No {registry} mapper registered for type {type_name}")]
    MapperNotRegistered {
        registry: RegistryKind,
        type_name: &'static str,
    },

    #[error("Column '{column}' is not present in the row")]
    MissingColumn { column: String },

    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Row width mismatch for {target}: expected {expected} values, got {actual}")]
    RowWidth {
        target: String,
        expected: usize,
        actual: usize,
    },

    #[error("Conversion failed for column '{column}': {reason}")]
    Conversion { column: String, reason: String },

    #[error("Expected {expected} result sets, got {actual}")]
    ResultSetCount { expected: usize, actual: usize },
}

/// Result type alias for mapping operations.
pub type MapResult<T> = Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_names_type_and_registry() {
        let err = MapError::MapperNotRegistered {
            registry: RegistryKind::Result,
            type_name: "orders::OrderView",
        };
        let msg = err.to_string();
        assert!(msg.contains("result mapper"));
        assert!(msg.contains("orders::OrderView"));
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = MapError::TypeMismatch {
            column: "count".to_string(),
            expected: "i32",
            actual: "text",
        };
        let msg = err.to_string();
        assert!(msg.contains("count"));
        assert!(msg.contains("i32"));
        assert!(msg.contains("text"));
    }
}
