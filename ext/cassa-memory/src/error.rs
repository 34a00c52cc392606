use cassa_core::CassaError;
use thiserror::Error;

/// Errors raised by the in-memory store itself
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("unconfigured table {0}")]
    UnconfiguredTable(String),

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("undefined column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("missing value for primary key column '{column}' of {table}")]
    MissingKey { table: String, column: String },

    #[error(
        "Cannot execute this query as it might involve data filtering and thus may have \
         unpredictable performance. If you want to execute this query despite the \
         performance unpredictability, use ALLOW FILTERING"
    )]
    FilteringRequired,

    #[error("column '{column}' of type {expected} cannot hold a {found} value")]
    TypeMismatch {
        column: String,
        expected: String,
        found: &'static str,
    },

    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl MemoryError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        MemoryError::InvalidStatement(msg.into())
    }
}

/// Store failures reach callers as execution errors, untouched
impl From<MemoryError> for CassaError {
    fn from(err: MemoryError) -> Self {
        CassaError::execution(err)
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
