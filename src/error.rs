//! Error types for refscope.
//!
//! Lookup-by-name misses are not errors inside the engine: they come back as
//! `Ok(None)` so batch work keeps going. `NotFound` exists for callers that
//! want to surface a miss as a value (see `Session::require`).

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while querying or exporting.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A required argument was empty, malformed, or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A named entity does not exist in the current scope.
    #[error("{what} not found: {name}")]
    NotFound { what: String, name: String },

    /// An export sink or snapshot file could not be read or written.
    #[error("i/o failure on {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The database session has already ended.
    #[error("database is closed")]
    ResourceClosed,

    /// A database snapshot could not be decoded or encoded.
    #[error("snapshot {}: {message}", path.display())]
    Snapshot { path: PathBuf, message: String },
}

impl GraphError {
    pub fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidArgument(message.into())
    }

    pub fn not_found(what: impl Into<String>, name: impl Into<String>) -> Self {
        GraphError::NotFound {
            what: what.into(),
            name: name.into(),
        }
    }

    pub fn io(target: impl Into<String>, source: std::io::Error) -> Self {
        GraphError::Io {
            target: target.into(),
            source,
        }
    }

    /// True for lookup misses, which callers report as "no result".
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
