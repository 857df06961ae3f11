//! Error types shared by the storage layer and the lifecycle engine

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{GraphError, IdError};
use crate::storage::HierarchyError;

pub type Result<T, E = TrellisError> = std::result::Result<T, E>;

/// Broad error category, for callers that only need to branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Dependency,
    Format,
    Io,
}

#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A search found no matching object
    #[error("{0}")]
    NoneAvailable(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Dependency(String),

    #[error("{0}")]
    Format(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrellisError {
    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrellisError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the broad category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrellisError::NotFound(_) | TrellisError::NoneAvailable(_) => ErrorKind::NotFound,
            TrellisError::Validation(_)
            | TrellisError::InvalidId(_)
            | TrellisError::Hierarchy(_) => ErrorKind::Validation,
            TrellisError::Graph(_) | TrellisError::Dependency(_) => ErrorKind::Dependency,
            TrellisError::Format(_) => ErrorKind::Format,
            TrellisError::Io { .. } => ErrorKind::Io,
        }
    }
}
