//! Common error types for PMT

use thiserror::Error;

/// Common result type for PMT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the PMT tools
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read or parse error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced entity not found by name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid row field or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
