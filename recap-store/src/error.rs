//! Error types for store operations.

use thiserror::Error;

/// Error type for store operations.
///
/// The cache treats every store failure as best-effort: a failed read is a
/// miss, a failed write leaves the previous entry in place. The split into
/// variants exists so backends can report what actually went wrong.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote backends.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send>),
}

impl StoreError {
    /// Wraps an error as an internal backend failure.
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + 'static,
    {
        StoreError::Internal(Box::new(error))
    }

    /// Wraps an error as a connection failure.
    pub fn connection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + 'static,
    {
        StoreError::Connection(Box::new(error))
    }
}
