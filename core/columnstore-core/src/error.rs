//! Error types for the column-store engine.
//!
//! All public APIs return `CsResult<T>` — no panics in library code.

use thiserror::Error;

/// Status codes carried on the wire response header (see the server crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    OkDone,
    OkWaitForResponse,
    UnknownCommand,
    ObjectNotFound,
    IncorrectFormat,
    QueryUnsupported,
    ExecutionError,
}

/// Unified error type for all engine operations.
#[derive(Debug, Error)]
pub enum CsError {
    /// A referenced database, table, column, handle or index does not exist.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The command did not match the grammar (§6 EBNF).
    #[error("incorrect format: {0}")]
    IncorrectFormat(String),

    /// The leading token of a command was not a recognized operator.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command parsed but is semantically rejected (e.g. no current database).
    #[error("query unsupported: {0}")]
    QueryUnsupported(String),

    /// The operator parsed and was accepted but failed during execution
    /// (allocation failure, join length mismatch, non-int multi-row print, ...).
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// I/O failure talking to the socket or the persistence directory.
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CsError {
    /// Map this error onto the wire status code the server sends back.
    pub fn status(&self) -> StatusCode {
        match self {
            CsError::ObjectNotFound(_) => StatusCode::ObjectNotFound,
            CsError::IncorrectFormat(_) => StatusCode::IncorrectFormat,
            CsError::UnknownCommand(_) => StatusCode::UnknownCommand,
            CsError::QueryUnsupported(_) => StatusCode::QueryUnsupported,
            CsError::ExecutionError(_) => StatusCode::ExecutionError,
            CsError::Io { .. } => StatusCode::ExecutionError,
        }
    }
}

/// Result type alias for all engine operations.
pub type CsResult<T> = Result<T, CsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_object_not_found() {
        let err = CsError::ObjectNotFound("db1.t1.a".to_string());
        assert_eq!(err.to_string(), "object not found: db1.t1.a");
        assert_eq!(err.status(), StatusCode::ObjectNotFound);
    }

    #[test]
    fn error_display_incorrect_format() {
        let err = CsError::IncorrectFormat("missing closing paren".to_string());
        assert_eq!(err.status(), StatusCode::IncorrectFormat);
    }

    #[test]
    fn error_status_execution_error() {
        let err = CsError::ExecutionError("join length mismatch".to_string());
        assert_eq!(err.status(), StatusCode::ExecutionError);
    }

    #[test]
    fn cs_result_ok() {
        let result: CsResult<i32> = Ok(42);
        assert_eq!(result.unwrap(), 42);
    }
}
