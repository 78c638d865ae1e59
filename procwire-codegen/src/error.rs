//! Generator error types.
//!
//! Generation is fail-fast: a field the generator cannot map aborts the run
//! instead of producing a mapper that silently drops it.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or PROCWIRE_GEN_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised while scanning sources or generating mappers.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: syn::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Field {type_name}.{field} has type {field_type}, which has no mapping")]
    UnmappedField {
        type_name: String,
        field: String,
        field_type: String,
    },

    #[error("Field {type_name}.{field} is declared {visibility}; generated mappers need pub or pub(crate) fields")]
    InaccessibleField {
        type_name: String,
        field: String,
        visibility: String,
    },

    #[error("Field {type_name}.{field} nests {nested} inside a tabular parameter; nested records may only hold scalar fields")]
    UnsupportedNesting {
        type_name: String,
        field: String,
        nested: String,
    },

    #[error("Type {name} is ambiguous: {}", candidates.join(", "))]
    AmbiguousType { name: String, candidates: Vec<String> },

    #[error("Type {name} referenced by {referenced_by} was not found in the scanned sources")]
    UnknownType { name: String, referenced_by: String },

    #[error("Invalid stored procedure descriptor {descriptor}: {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for generator operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_field_message() {
        let err = GenerateError::UnmappedField {
            type_name: "OrderView".to_string(),
            field: "created".to_string(),
            field_type: "std::time::SystemTime".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Field OrderView.created has type std::time::SystemTime, which has no mapping"
        );
    }

    #[test]
    fn test_ambiguous_type_lists_candidates() {
        let err = GenerateError::AmbiguousType {
            name: "Order".to_string(),
            candidates: vec!["crate::a::Order".to_string(), "crate::b::Order".to_string()],
        };
        assert!(err.to_string().contains("crate::a::Order, crate::b::Order"));
    }
}
