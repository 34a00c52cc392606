use thiserror::Error;

/// Boxed error reported by a query executor.
pub type ExecutorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for statement compilation, decoding and execution
#[derive(Error, Debug)]
pub enum CassaError {
    /// Schema or mapping problems detected while compiling a statement or
    /// constructing a table: unknown fields, overlapping keys, duplicate
    /// columns. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single-row read matched no rows
    #[error("Row not found")]
    RowNotFound,

    /// A value returned by the executor could not be placed into a field
    #[error("Decode error: {0}")]
    Decode(String),

    /// Whatever the executor reported, passed through untouched
    #[error("Execution error: {0}")]
    Execution(#[source] ExecutorError),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for cassa operations
pub type Result<T> = std::result::Result<T, CassaError>;

impl CassaError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        CassaError::Configuration(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        CassaError::Decode(msg.into())
    }

    /// Wrap an executor failure
    pub fn execution<E: Into<ExecutorError>>(err: E) -> Self {
        CassaError::Execution(err.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        CassaError::Internal(msg.into())
    }

    /// True when a single-row read found nothing
    pub fn is_row_not_found(&self) -> bool {
        matches!(self, CassaError::RowNotFound)
    }

    fn prefixed(self, ctx: String) -> Self {
        match self {
            CassaError::Configuration(msg) => {
                CassaError::Configuration(format!("{}: {}", ctx, msg))
            }
            CassaError::Decode(msg) => CassaError::Decode(format!("{}: {}", ctx, msg)),
            CassaError::Internal(msg) => CassaError::Internal(format!("{}: {}", ctx, msg)),
            // absence and driver errors keep their identity
            other => other,
        }
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<CassaError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| e.into().prefixed(ctx.into()))
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().prefixed(f().into()))
    }
}
