//! Project management
//!
//! Handles project initialization and provides access to the store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::local::{LocalRepository, STORE_DIR};
use super::Config;
use crate::engine::{Engine, EngineOptions};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a trellis project. Run 'trellis init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# Trellis configuration

# Mark a feature, epic or project done when its last child completes
auto_complete_parent = false

# Priority for new objects when --priority is not given
default_priority = "medium"

[prune]
# Closed objects older than this many days are removed by 'trellis prune'
age_days = 30
"#;

/// A Trellis project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(STORE_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path. Safe to run twice.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store_dir = root.join(STORE_DIR);

        fs::create_dir_all(&store_dir).with_context(|| {
            format!("Failed to create .trellis directory: {}", store_dir.display())
        })?;

        let config_path = store_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .trellis directory path
    pub fn store_dir(&self) -> PathBuf {
        self.root.join(STORE_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the object store
    pub fn repository(&self) -> LocalRepository {
        LocalRepository::for_project(&self.root)
    }

    /// Returns an engine over the object store, configured from
    /// `config.toml`
    pub fn engine(&self) -> Engine<LocalRepository> {
        Engine::with_options(
            self.repository(),
            EngineOptions {
                auto_complete_parent: self.config.project.auto_complete_parent,
            },
        )
    }
}
