//! # Lifecycle Engine
//!
//! Hierarchy-aware operations built on the [`Repository`] contract.
//!
//! | Operation | Module | Effect |
//! |-----------|--------|--------|
//! | claim | `claim` | task -> in-progress, ancestors -> in-progress |
//! | complete | `complete` | task -> done, optional parent auto-completion |
//! | delete / prune | `prune` | dependency-aware removal, age-based batch removal |
//! | create / update / append | `objects` | validated edits |
//!
//! Multi-step operations are not transactional: every step is an
//! independent save, and a crash mid-way leaves ancestors partially updated.
//!
//! Top-level operations never fail outright; they return an [`Outcome`]
//! carrying either the result or a categorized, human-readable failure.

mod prerequisites;
mod claim;
mod complete;
mod prune;
mod objects;

#[cfg(test)]
pub(crate) mod testing;

pub use prerequisites::{
    check_hierarchical_prerequisites_complete, check_prerequisites_complete, filter_unavailable,
    is_required_for_other_objects,
};
pub use claim::ClaimRequest;
pub use complete::CompleteRequest;
pub use prune::PruneReport;
pub use objects::{CreateRequest, UpdatePatch};

use thiserror::Error;

use crate::error::{ErrorKind, Result};
use crate::storage::Repository;

/// Behavior switches for the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Mark parents done once all their children are closed
    pub auto_complete_parent: bool,
}

/// A failed top-level operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Result of a top-level operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns the failure message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(failure) => Some(&failure.message),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, Failure> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => {
                tracing::debug!(error = %error, "operation failed");
                Outcome::Failure(Failure {
                    kind: error.kind(),
                    message: error.to_string(),
                })
            }
        }
    }
}

/// The lifecycle engine, composed over a storage collaborator
pub struct Engine<R> {
    repo: R,
    options: EngineOptions,
}

impl<R: Repository> Engine<R> {
    /// Creates an engine with default options
    pub fn new(repo: R) -> Self {
        Self::with_options(repo, EngineOptions::default())
    }

    /// Creates an engine with the given options
    pub fn with_options(repo: R, options: EngineOptions) -> Self {
        Self { repo, options }
    }

    /// Returns the storage collaborator
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Returns the engine options
    pub fn options(&self) -> EngineOptions {
        self.options
    }
}
