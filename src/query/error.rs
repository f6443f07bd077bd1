//! Query error types
//!
//! Errors raised while building or parsing a query, before anything is sent.

use thiserror::Error;

/// Errors that can occur while constructing a query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A structural invariant of the query was violated
    #[error("Validation error: {0}")]
    Validation(String),

    /// A textual value (operator, granularity, direction) was not recognised
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
