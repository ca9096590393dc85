use thiserror::Error;

/// Boxed driver error carried by [`EntError::Store`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EntError {
    /// No rows returned when at least one was expected
    #[error("{label} not found")]
    NotFound { label: &'static str },

    /// More than one row returned when at most one was expected
    #[error("{label} not singular")]
    NotSingular { label: &'static str },

    /// Edge rows that cannot be mapped back onto the queried parent batch
    #[error("inconsistent edge data: {0}")]
    InconsistentEdgeData(String),

    /// Scanned row shape does not match the entity metadata
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Underlying driver or connectivity failure
    #[error("store error: {0}")]
    Store(#[source] BoxError),

    /// Query that cannot be rendered or scanned as requested
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Transaction used after commit or rollback
    #[error("transaction has already been committed or rolled back")]
    TxDone,

    /// Edge read without having been requested for eager loading
    #[error("edge \"{edge}\" was not loaded")]
    NotLoaded { edge: &'static str },
}

impl EntError {
    /// Wraps any driver error.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        EntError::Store(err.into())
    }

    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        EntError::InvalidQuery(msg.into())
    }

    pub fn mismatch<T: Into<String>>(msg: T) -> Self {
        EntError::SchemaMismatch(msg.into())
    }

    pub fn inconsistent<T: Into<String>>(msg: T) -> Self {
        EntError::InconsistentEdgeData(msg.into())
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, EntError::NotFound { .. })
    }

    pub const fn is_not_singular(&self) -> bool {
        matches!(self, EntError::NotSingular { .. })
    }

    /// Only store failures may succeed when retried; every other kind is
    /// deterministic for the same query and data.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, EntError::Store(_))
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, EntError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed");
        let err = EntError::store(io);
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "store error: socket closed");
    }

    #[test]
    fn only_store_errors_are_retryable() {
        assert!(!EntError::NotFound { label: "service" }.is_retryable());
        assert!(!EntError::TxDone.is_retryable());
        assert!(!EntError::invalid("zero columns").is_retryable());
    }
}
