//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Setup | Project management | `init` |
//! | Objects | Create, inspect and edit | `create`, `show`, `list`, `next`, `update`, `log`, `files` |
//! | Lifecycle | Hierarchy-aware transitions | `claim`, `complete`, `delete`, `prune` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. `--verbose` (or `-v`)
//! enables debug output; `TRELLIS_LOG` takes any `EnvFilter` directive:
//! ```bash
//! TRELLIS_LOG=trellis_cli=trace trellis claim
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod object_cmd;
mod lifecycle_cmd;

pub use app::{parse_file_change, run, Cli, Commands, LOG_ENV};
pub use output::{Output, OutputFormat};
