//! Error types for SnapDB
//!
//! This module defines all error types used throughout the database engine.

use crate::catalog::DataType;
use thiserror::Error;

/// The main error type for SnapDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Parse error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Parse error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Parse error: invalid number format at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    // ========== Schema Errors ==========
    #[error("Schema error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Schema error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Schema error: column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Schema error: duplicate column '{0}' in table '{1}'")]
    DuplicateColumn(String, String),

    #[error("Schema error: table '{0}' declares more than one PRIMARY KEY column")]
    MultiplePrimaryKeys(String),

    #[error("Schema error: join condition must reference both tables, got '{0}'")]
    InvalidJoin(String),

    // ========== Constraint Errors ==========
    #[error("Constraint violation: null value not allowed for column '{0}'")]
    NullNotAllowed(String),

    #[error("Constraint violation: duplicate value {value} for unique column '{column}'")]
    UniqueViolation { column: String, value: String },

    #[error("Constraint violation: primary key value {0} is out of range")]
    PrimaryKeyOutOfRange(i64),

    // ========== Type Errors ==========
    #[error("Type error: value {found} does not match declared type {expected} of column '{column}'")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: String,
    },

    #[error("Type error: statement supplies {found} values for {expected} columns")]
    ColumnCountMismatch { expected: usize, found: usize },

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: snapshot is not readable: {0}")]
    SnapshotDecode(String),
}

/// Coarse classification of an [`Error`], matching the engine's public
/// error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Schema,
    Constraint,
    Type,
    Io,
}

impl Error {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter(_, _)
            | Error::UnterminatedString(_)
            | Error::InvalidNumber(_)
            | Error::UnexpectedToken { .. }
            | Error::UnexpectedEof(_) => ErrorKind::Parse,

            Error::TableNotFound(_)
            | Error::TableAlreadyExists(_)
            | Error::ColumnNotFound(_, _)
            | Error::DuplicateColumn(_, _)
            | Error::MultiplePrimaryKeys(_)
            | Error::InvalidJoin(_) => ErrorKind::Schema,

            Error::NullNotAllowed(_)
            | Error::UniqueViolation { .. }
            | Error::PrimaryKeyOutOfRange(_) => ErrorKind::Constraint,

            Error::TypeMismatch { .. } | Error::ColumnCountMismatch { .. } => ErrorKind::Type,

            Error::Io(_) | Error::SnapshotDecode(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for SnapDB operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Schema error: table 'users' not found");

        let err = Error::UnexpectedCharacter('@', 5);
        assert_eq!(
            err.to_string(),
            "Parse error: unexpected character '@' at position 5"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::UnexpectedEof("literal".into()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            Error::TableAlreadyExists("users".into()).kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            Error::NullNotAllowed("email".into()).kind(),
            ErrorKind::Constraint
        );
        assert_eq!(
            Error::ColumnCountMismatch {
                expected: 3,
                found: 2
            }
            .kind(),
            ErrorKind::Type
        );
        assert_eq!(Error::SnapshotDecode("bad json".into()).kind(), ErrorKind::Io);
    }
}
