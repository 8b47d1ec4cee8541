//! Common error types for the Radio Dopo services

use thiserror::Error;

/// Common result type for shared operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared across the site services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A CMS record could not be decoded into the content model
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
