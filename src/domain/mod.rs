//! Domain models for the tracker
//!
//! Contains the core data types without any I/O concerns.

mod id;
mod object;
mod graph;

pub use id::{generate_id, IdError, ObjectKind};
pub use object::{timestamp_now, ObjectStatus, Priority, TrellisObject, SCHEMA_VERSION};
pub use graph::{GraphError, PrerequisiteGraph};
