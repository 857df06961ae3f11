//! Object identifiers
//!
//! ID Format: `{prefix}-{slug}` where the prefix letter (case-insensitive)
//! names the object kind:
//! - `P-` Project (e.g., `P-web-app`)
//! - `E-` Epic (e.g., `E-auth`)
//! - `F-` Feature (e.g., `F-login-form`)
//! - `T-` Task (e.g., `T-add-submit-button`)
//!
//! The kind is never stored on disk; it is always re-derived from the id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest slug generated from a title
const MAX_SLUG_LEN: usize = 40;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid object ID '{0}': expected '<P|E|F|T>-<name>'")]
    InvalidId(String),

    #[error("Unknown object kind: {0}")]
    UnknownKind(String),
}

/// The four levels of the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Project,
    Epic,
    Feature,
    Task,
}

impl ObjectKind {
    /// Derives the kind from an id's prefix
    pub fn from_id(id: &str) -> Result<Self, IdError> {
        let mut chars = id.chars();
        let prefix = chars.next();
        if chars.next() != Some('-') {
            return Err(IdError::InvalidId(id.to_string()));
        }

        match prefix.map(|c| c.to_ascii_lowercase()) {
            Some('p') => Ok(ObjectKind::Project),
            Some('e') => Ok(ObjectKind::Epic),
            Some('f') => Ok(ObjectKind::Feature),
            Some('t') => Ok(ObjectKind::Task),
            _ => Err(IdError::InvalidId(id.to_string())),
        }
    }

    /// Returns the canonical id prefix (`P`, `E`, `F`, `T`)
    pub fn prefix(&self) -> char {
        match self {
            ObjectKind::Project => 'P',
            ObjectKind::Epic => 'E',
            ObjectKind::Feature => 'F',
            ObjectKind::Task => 'T',
        }
    }

    /// Plural label for the kind of children this kind contains,
    /// or None for tasks (which contain nothing)
    pub fn child_label(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Project => Some("epics"),
            ObjectKind::Epic => Some("features"),
            ObjectKind::Feature => Some("tasks"),
            ObjectKind::Task => None,
        }
    }

    /// Returns true if objects of this kind own a containment folder
    pub fn owns_folder(&self) -> bool {
        !matches!(self, ObjectKind::Task)
    }

    /// Returns all kinds, leaves last
    pub fn all() -> &'static [ObjectKind] {
        &[
            ObjectKind::Project,
            ObjectKind::Epic,
            ObjectKind::Feature,
            ObjectKind::Task,
        ]
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Project => "project",
            ObjectKind::Epic => "epic",
            ObjectKind::Feature => "feature",
            ObjectKind::Task => "task",
        };
        f.pad(name)
    }
}

impl FromStr for ObjectKind {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" | "p" => Ok(ObjectKind::Project),
            "epic" | "e" => Ok(ObjectKind::Epic),
            "feature" | "f" => Ok(ObjectKind::Feature),
            "task" | "t" => Ok(ObjectKind::Task),
            _ => Err(IdError::UnknownKind(s.to_string())),
        }
    }
}

/// Generates a 7-character hash from title and timestamp
fn generate_hash(title: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", title, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Converts a title into a kebab-case slug
fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}

/// Generates an id for a new object from its title.
///
/// `exists` reports whether a candidate id is already taken; collisions
/// get a numeric suffix (`-2`, `-3`, ...).
pub fn generate_id(
    kind: ObjectKind,
    title: &str,
    timestamp: DateTime<Utc>,
    exists: impl Fn(&str) -> bool,
) -> String {
    let mut slug = slugify(title);
    if slug.is_empty() {
        slug = generate_hash(title, timestamp);
    }

    let base = format!("{}-{}", kind.prefix(), slug);
    if !exists(&base) {
        return base;
    }

    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !exists(candidate))
        .unwrap_or(base)
}
