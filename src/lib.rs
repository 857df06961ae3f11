//! Trellis - a local-first hierarchical work-item tracker
//!
//! Work is organized as projects, epics, features and tasks, each stored as
//! a markdown document in a directory tree that mirrors the hierarchy. The
//! lifecycle engine keeps that tree consistent: claiming a task marks its
//! ancestors in progress, completing the last task of a feature can close
//! the feature, and deletion respects both containment and prerequisites.

pub mod domain;
pub mod error;
pub mod storage;
pub mod engine;
pub mod cli;

pub use domain::{ObjectKind, ObjectStatus, Priority, TrellisObject};
pub use engine::{Engine, EngineOptions, Outcome};
pub use error::{ErrorKind, TrellisError};
pub use storage::{LocalRepository, ObjectQuery, Repository};
