//! Error types for carvault
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for carvault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store write failed: {0}")]
    WriteFailure(String),

    #[error("Store read failed: {0}")]
    ReadFailure(String),

    #[error("Corrupt data with no usable backup: {0}")]
    CorruptData(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Cache Errors
    // -------------------------------------------------------------------------
    #[error("Cache miss: {0}")]
    CacheMiss(String),

    #[error("Cache read failed: {0}")]
    CacheReadFailure(String),

    #[error("Cache write failed: {0}")]
    CacheWriteFailure(String),

    #[error("Fallback failed: {0}")]
    FallbackFailure(Box<VaultError>),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VaultError {
    /// True if this error (or the authoritative error behind a failed
    /// fallback) means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            VaultError::NotFound(_) => true,
            VaultError::FallbackFailure(inner) => inner.is_not_found(),
            _ => false,
        }
    }

    /// Unwraps a `FallbackFailure` to the authoritative error that caused it.
    pub fn into_authoritative(self) -> VaultError {
        match self {
            VaultError::FallbackFailure(inner) => inner.into_authoritative(),
            other => other,
        }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            VaultError::NotFound(_) => 404,
            VaultError::Validation(_) => 400,
            VaultError::FallbackFailure(inner) => inner.status_code(),
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Serialization(err.to_string())
    }
}
