//! # Storage Layer
//!
//! Persistence for Trellis objects as a directory tree of markdown files.
//!
//! ## Layout
//!
//! The store lives in `.trellis/` at the project root. Folders encode
//! containment; a task's folder encodes whether it is closed.
//!
//! ```text
//! .trellis/
//! ├── config.toml
//! ├── p/P-web/
//! │   ├── P-web.md
//! │   └── e/E-auth/
//! │       ├── E-auth.md
//! │       └── f/F-login/
//! │           ├── F-login.md
//! │           └── t/
//! │               ├── open/T-form.md
//! │               └── closed/T-old.md
//! ├── f/F-standalone/F-standalone.md
//! └── t/open/T-loose.md
//! ```
//!
//! ## Concurrency
//!
//! None. A single process is assumed to own the store. Writes are atomic
//! (temp file + rename) but multi-step operations are not.
//!
//! ## Key Types
//!
//! - [`Repository`] - Storage contract the engine is written against
//! - [`LocalRepository`] - Filesystem implementation
//! - [`Project`] - Entry point for a project on disk
//! - [`Config`] - Project and global configuration

mod markdown;
mod paths;
mod scanner;
mod repository;
mod local;
mod config;
mod project;

pub use markdown::{parse_document, render_document};
pub use paths::{resolve_path, HierarchyError, DOCUMENT_EXTENSION};
pub use scanner::{scan_documents, ScanOptions};
pub use repository::{ObjectQuery, Repository};
pub use local::{LocalRepository, STORE_DIR};
pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, PruneConfig};
pub use project::{Project, ProjectError};
