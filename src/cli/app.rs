//! Main CLI application structure

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{lifecycle_cmd, object_cmd};
use crate::domain::{ObjectKind, ObjectStatus, Priority};
use crate::storage::{Config, Project};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "TRELLIS_LOG";

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about = "Hierarchical work-item tracker: projects, epics, features and tasks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (defaults to the nearest directory containing .trellis/)
    #[arg(long, global = true, env = "TRELLIS_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new trellis project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Create a project, epic, feature or task
    ///
    /// Examples:
    ///   trellis create project "Web App"
    ///   trellis create epic "Auth" --parent P-web-app
    ///   trellis create task "Login form" --parent F-login --priority high
    Create {
        /// Object kind (project, epic, feature, task)
        kind: ObjectKind,

        /// Title
        title: String,

        /// Parent object ID
        #[arg(long)]
        parent: Option<String>,

        /// Priority (high, medium, low); defaults to the project config
        #[arg(long)]
        priority: Option<Priority>,

        /// Initial status (draft or open)
        #[arg(long, default_value = "open")]
        status: ObjectStatus,

        /// Prerequisite object ID (repeatable)
        #[arg(long = "prerequisite")]
        prerequisites: Vec<String>,

        /// Document body
        #[arg(long, default_value = "")]
        body: String,

        /// Explicit ID instead of one generated from the title
        #[arg(long)]
        id: Option<String>,
    },

    /// Show one object
    Show {
        /// Object ID
        id: String,
    },

    /// List objects
    List {
        /// Only this kind
        #[arg(long)]
        kind: Option<ObjectKind>,

        /// Only this status
        #[arg(long)]
        status: Option<ObjectStatus>,

        /// Only this priority
        #[arg(long)]
        priority: Option<Priority>,

        /// Only objects inside this object's subtree
        #[arg(long)]
        scope: Option<String>,

        /// Include done and wont-do objects
        #[arg(long)]
        include_closed: bool,
    },

    /// Show the next object that is ready to work on, without claiming it
    Next {
        /// Kind to look for (defaults to task)
        #[arg(long)]
        kind: Option<ObjectKind>,

        /// Only objects inside this object's subtree
        #[arg(long)]
        scope: Option<String>,
    },

    /// Edit an object
    Update {
        /// Object ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        /// New status; in-progress and done need --force
        #[arg(long)]
        status: Option<ObjectStatus>,

        #[arg(long)]
        body: Option<String>,

        /// Replace prerequisites (repeatable)
        #[arg(long = "prerequisite", conflicts_with = "clear_prerequisites")]
        prerequisites: Vec<String>,

        /// Remove all prerequisites
        #[arg(long)]
        clear_prerequisites: bool,

        /// Allow lifecycle status changes
        #[arg(long)]
        force: bool,
    },

    /// Claim a task and mark its ancestors in progress
    Claim {
        /// Task ID (omit to pick the next available task)
        id: Option<String>,

        /// Only pick tasks inside this object's subtree
        #[arg(long, conflicts_with = "id")]
        scope: Option<String>,

        /// Skip status and prerequisite checks
        #[arg(long)]
        force: bool,
    },

    /// Complete an in-progress task
    Complete {
        /// Task ID
        id: String,

        /// Summary of the work, appended to the log
        #[arg(long)]
        summary: String,

        /// Changed file as PATH=DESCRIPTION (repeatable)
        #[arg(long = "file", value_parser = parse_file_change)]
        files: Vec<(String, String)>,

        /// Close parents whose children are all closed
        #[arg(long)]
        auto_complete_parent: bool,
    },

    /// Append a log entry
    Log {
        /// Object ID
        id: String,

        /// Entry text
        entry: String,
    },

    /// Record changed files as PATH=DESCRIPTION
    Files {
        /// Object ID
        id: String,

        #[arg(required = true, value_parser = parse_file_change)]
        files: Vec<(String, String)>,
    },

    /// Delete an object and everything it contains
    Delete {
        /// Object ID
        id: String,

        /// Delete even if other open objects require it
        #[arg(long)]
        force: bool,
    },

    /// Delete closed objects that have not changed for a while
    Prune {
        /// Age threshold in days (defaults to the project config)
        #[arg(long)]
        days: Option<u32>,

        /// Only prune inside this object's subtree
        #[arg(long)]
        scope: Option<String>,
    },
}

/// Parses `PATH=DESCRIPTION`
pub fn parse_file_change(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((path, description)) if !path.is_empty() => {
            Ok((path.to_string(), description.to_string()))
        }
        _ => Err(format!("expected PATH=DESCRIPTION, got '{}'", s)),
    }
}

/// Installs the stderr log subscriber
fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Opens the project at `--root`, or the one containing the current directory
pub(crate) fn open_project(root: Option<&Path>) -> Result<Project> {
    match root {
        Some(root) => Project::open(root),
        None => Project::open_current(),
    }
}

/// Main entry point for the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = cli.format.unwrap_or_else(|| {
        Config::load_global()
            .map(|global| global.default_format)
            .unwrap_or_else(|error| {
                let message = format!("{:#}", error);
                tracing::warn!(error = %message, "ignoring global config");
                OutputFormat::default()
            })
    });
    let output = Output::new(format);

    match dispatch(cli.command, cli.root.as_deref(), &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            output.error(&format!("{:#}", error));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands, root: Option<&Path>, output: &Output) -> Result<()> {
    if let Commands::Init { path } = &command {
        let project = Project::init(root.unwrap_or(path.as_path()))?;
        tracing::debug!(path = %project.store_dir().display(), "initialized store");
        output.success(&format!("Initialized trellis project at {}", project.root().display()));
        return Ok(());
    }

    let project = open_project(root)?;

    match command {
        Commands::Init { .. } => Ok(()),

        Commands::Create { kind, title, parent, priority, status, prerequisites, body, id } => {
            let priority = priority.unwrap_or(project.config().project.default_priority);
            object_cmd::create(
                &project,
                output,
                object_cmd::CreateArgs { kind, title, parent, priority, status, prerequisites, body, id },
            )
        }
        Commands::Show { id } => object_cmd::show(&project, output, &id),
        Commands::List { kind, status, priority, scope, include_closed } => object_cmd::list(
            &project,
            output,
            object_cmd::ListArgs { kind, status, priority, scope, include_closed },
        ),
        Commands::Next { kind, scope } => object_cmd::next(&project, output, kind, scope.as_deref()),
        Commands::Update { id, title, priority, status, body, prerequisites, clear_prerequisites, force } => {
            let prerequisites = if clear_prerequisites {
                Some(Vec::new())
            } else if prerequisites.is_empty() {
                None
            } else {
                Some(prerequisites)
            };
            let patch = crate::engine::UpdatePatch { title, priority, status, body, prerequisites };
            object_cmd::update(&project, output, &id, &patch, force)
        }
        Commands::Log { id, entry } => object_cmd::log(&project, output, &id, &entry),
        Commands::Files { id, files } => object_cmd::files(&project, output, &id, &files),

        Commands::Claim { id, scope, force } => lifecycle_cmd::claim(&project, output, id, scope, force),
        Commands::Complete { id, summary, files, auto_complete_parent } => {
            let auto = auto_complete_parent || project.config().project.auto_complete_parent;
            lifecycle_cmd::complete(&project, output, &id, &summary, files, auto)
        }
        Commands::Delete { id, force } => lifecycle_cmd::delete(&project, output, &id, force),
        Commands::Prune { days, scope } => {
            let days = days.unwrap_or(project.config().project.prune.age_days);
            lifecycle_cmd::prune(&project, output, days, scope.as_deref())
        }
    }
}
