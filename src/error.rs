//! Unified error types for the dispatch engine.
//!
//! Port-level errors ([`GatewayError`](crate::app::ports::GatewayError),
//! [`StorageError`]) live next to the port traits, and configuration
//! errors next to the config.  This module adds the persistence layer on
//! top of storage and the [`Error`] returned by the settings operations.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Local state could not be read or written.
    Persistence(PersistenceError),
    /// A caller-supplied value was rejected.
    Validation(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<PersistenceError> for Error {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Persistence(PersistenceError::Storage(e))
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

/// Failure to load or save a structured record (ledger, monitor status,
/// threshold).  Callers on the polling path log these and fail open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The storage backend failed.
    Storage(StorageError),
    /// The stored value exists but does not decode.
    Corrupted(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Corrupted(msg) => write!(f, "corrupted record: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<StorageError> for PersistenceError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupted(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
