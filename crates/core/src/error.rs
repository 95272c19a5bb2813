//! Error types for the Pivotal table engine.

use crate::types::DataType;
use crate::value::Value;
use alloc::string::String;
use core::fmt;

/// Result type alias for Pivotal operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Broad error classes reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown or malformed column reference, duplicate or read-only column.
    Schema,
    /// A value failed coercion, or a declared type conflicts.
    Type,
    /// Input list length mismatch or dependency cycle.
    Arity,
    /// An update target could not be resolved.
    Key,
    /// The target table or view has been deleted.
    Disposed,
    /// Anything else.
    Operation,
}

/// Error types for Pivotal operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A value does not fit the column type.
    TypeMismatch {
        column: String,
        expected: DataType,
        got: Value,
    },
    /// An aggregate cannot be applied to a column type.
    IncompatibleAggregate {
        column: String,
        aggregate: String,
        data_type: DataType,
    },
    /// Invalid schema definition.
    InvalidSchema {
        message: String,
    },
    /// Column not found.
    ColumnNotFound {
        table: String,
        column: String,
    },
    /// Column already exists.
    DuplicateColumn {
        table: String,
        column: String,
    },
    /// A computed column was written by an update payload.
    ReadOnlyColumn {
        column: String,
    },
    /// Input count does not match the combining function.
    ArityMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
    /// Computed columns depend on each other in a loop.
    DependencyCycle {
        column: String,
    },
    /// Update target could not be resolved.
    RowNotFound {
        table: String,
        key: Value,
    },
    /// A primary-keyed table received a payload without its key.
    MissingKey {
        table: String,
        column: String,
    },
    /// Table or view was deleted before the work ran.
    Disposed {
        target: String,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch { column, expected, got } => {
                write!(f, "Type mismatch on column {}: expected {}, got {:?}", column, expected, got)
            }
            Error::IncompatibleAggregate { column, aggregate, data_type } => {
                write!(
                    f,
                    "Aggregate {} cannot be applied to column {} of type {}",
                    aggregate, column, data_type
                )
            }
            Error::InvalidSchema { message } => {
                write!(f, "Invalid schema: {}", message)
            }
            Error::ColumnNotFound { table, column } => {
                write!(f, "Column {} not found in table {}", column, table)
            }
            Error::DuplicateColumn { table, column } => {
                write!(f, "Column {} already exists in table {}", column, table)
            }
            Error::ReadOnlyColumn { column } => {
                write!(f, "Computed column {} cannot be updated", column)
            }
            Error::ArityMismatch { column, expected, got } => {
                write!(
                    f,
                    "Computed column {} expects {} input(s), got {}",
                    column, expected, got
                )
            }
            Error::DependencyCycle { column } => {
                write!(f, "Computed column {} depends on itself", column)
            }
            Error::RowNotFound { table, key } => {
                write!(f, "No row for {:?} in table {}", key, table)
            }
            Error::MissingKey { table, column } => {
                write!(f, "Update to table {} is missing key column {}", table, column)
            }
            Error::Disposed { target } => {
                write!(f, "{} has been deleted", target)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TypeMismatch { .. } | Error::IncompatibleAggregate { .. } => ErrorKind::Type,
            Error::InvalidSchema { .. }
            | Error::ColumnNotFound { .. }
            | Error::DuplicateColumn { .. }
            | Error::ReadOnlyColumn { .. } => ErrorKind::Schema,
            Error::ArityMismatch { .. } | Error::DependencyCycle { .. } => ErrorKind::Arity,
            Error::RowNotFound { .. } | Error::MissingKey { .. } => ErrorKind::Key,
            Error::Disposed { .. } => ErrorKind::Disposed,
            Error::InvalidOperation { .. } => ErrorKind::Operation,
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(column: impl Into<String>, expected: DataType, got: Value) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got,
        }
    }

    /// Creates an incompatible aggregate error.
    pub fn incompatible_aggregate(
        column: impl Into<String>,
        aggregate: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Error::IncompatibleAggregate {
            column: column.into(),
            aggregate: aggregate.into(),
            data_type,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a duplicate column error.
    pub fn duplicate_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::DuplicateColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a read-only column error.
    pub fn read_only(column: impl Into<String>) -> Self {
        Error::ReadOnlyColumn {
            column: column.into(),
        }
    }

    /// Creates an arity mismatch error.
    pub fn arity_mismatch(column: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityMismatch {
            column: column.into(),
            expected,
            got,
        }
    }

    /// Creates a dependency cycle error.
    pub fn dependency_cycle(column: impl Into<String>) -> Self {
        Error::DependencyCycle {
            column: column.into(),
        }
    }

    /// Creates a row not found error.
    pub fn row_not_found(table: impl Into<String>, key: Value) -> Self {
        Error::RowNotFound {
            table: table.into(),
            key,
        }
    }

    /// Creates a missing key error.
    pub fn missing_key(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::MissingKey {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a disposed error.
    pub fn disposed(target: impl Into<String>) -> Self {
        Error::Disposed {
            target: target.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::type_mismatch("x", DataType::Int64, Value::String("a".into()));
        assert!(err.to_string().contains("Type mismatch"));
        assert!(err.to_string().contains("integer"));

        let err = Error::column_not_found("t", "missing");
        assert!(err.to_string().contains("missing"));

        let err = Error::arity_mismatch("ratio", 2, 1);
        assert!(err.to_string().contains("expects 2"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::invalid_schema("bad").kind(), ErrorKind::Schema);
        assert_eq!(Error::read_only("c").kind(), ErrorKind::Schema);
        assert_eq!(
            Error::incompatible_aggregate("y", "sum", DataType::String).kind(),
            ErrorKind::Type
        );
        assert_eq!(Error::dependency_cycle("a").kind(), ErrorKind::Arity);
        assert_eq!(Error::row_not_found("t", Value::Int64(9)).kind(), ErrorKind::Key);
        assert_eq!(Error::missing_key("t", "id").kind(), ErrorKind::Key);
        assert_eq!(Error::disposed("view").kind(), ErrorKind::Disposed);
    }
}
