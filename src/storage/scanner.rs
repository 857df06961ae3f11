//! Directory scanner
//!
//! Recursively collects object documents under the store root. A missing
//! root is an empty store; unreadable subdirectories are logged and skipped.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::paths::{CLOSED_DIR, DOCUMENT_EXTENSION, TASKS_DIR};

/// Filters applied while scanning
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Include documents under a `t/closed` folder
    pub include_closed: bool,

    /// Only match documents inside the subtree of this object id
    pub scope: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_closed: true,
            scope: None,
        }
    }
}

impl ScanOptions {
    /// Scan everything, including closed tasks
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns true if a path relative to the root passes the filters
    fn matches(&self, relative: &Path) -> bool {
        let segments: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        if !self.include_closed
            && segments
                .windows(2)
                .any(|pair| pair[0] == TASKS_DIR && pair[1] == CLOSED_DIR)
        {
            return false;
        }

        match &self.scope {
            Some(scope) => segments.iter().any(|s| s == scope),
            None => true,
        }
    }
}

fn is_document(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == DOCUMENT_EXTENSION)
}

/// Returns all document paths under `root` that pass `options`, sorted
pub fn scan_documents(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if !root.is_dir() {
        return files;
    }

    collect(root, &mut files);

    let mut matched: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| {
            path.strip_prefix(root)
                .map(|relative| options.matches(relative))
                .unwrap_or(false)
        })
        .collect();
    matched.sort();
    matched
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(path = %dir.display(), error = %error, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(path = %dir.display(), error = %error, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            collect(&path, files);
        } else if is_document(&path) {
            files.push(path);
        }
    }
}
