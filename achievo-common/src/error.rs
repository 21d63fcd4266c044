//! Common error types for achievo

use thiserror::Error;

/// Common result type for achievo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across achievo crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation aborted through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
