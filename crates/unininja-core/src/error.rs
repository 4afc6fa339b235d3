//! Error types for the domain layer

use thiserror::Error;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors raised while building domain records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Identifier was empty or contained characters that cannot appear in a path segment
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// An upstream record did not carry a field the gateway needs
    #[error("{record} is missing field {field}")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
}
