//! Work-item domain model
//!
//! A single entity type covers every level of the hierarchy; its kind is
//! derived from the id prefix.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::id::{IdError, ObjectKind};

/// Current document schema version
pub const SCHEMA_VERSION: &str = "1.0";

/// Returns the current time in the on-disk timestamp format
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Status of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectStatus {
    /// Not yet ready to be worked
    Draft,

    /// Ready to be claimed
    #[default]
    Open,

    /// Claimed and being worked on
    InProgress,

    /// Successfully completed
    Done,

    /// Abandoned
    WontDo,
}

impl ObjectStatus {
    /// Returns true for done and wont-do
    pub fn is_closed(&self) -> bool {
        matches!(self, ObjectStatus::Done | ObjectStatus::WontDo)
    }

    /// Returns true for statuses a claim may start from
    pub fn is_claimable(&self) -> bool {
        matches!(self, ObjectStatus::Draft | ObjectStatus::Open)
    }

    /// Returns the on-disk spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectStatus::Draft => "draft",
            ObjectStatus::Open => "open",
            ObjectStatus::InProgress => "in-progress",
            ObjectStatus::Done => "done",
            ObjectStatus::WontDo => "wont-do",
        }
    }

    /// Returns all valid status values
    pub fn all() -> &'static [ObjectStatus] {
        &[
            ObjectStatus::Draft,
            ObjectStatus::Open,
            ObjectStatus::InProgress,
            ObjectStatus::Done,
            ObjectStatus::WontDo,
        ]
    }
}

impl std::fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ObjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid status value: {}", s))
    }
}

/// Priority of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: lower ranks are picked first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    /// Returns the on-disk spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Invalid priority value: {}", s)),
        }
    }
}

/// A project, epic, feature or task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrellisObject {
    /// Unique identifier; its prefix determines `kind`
    pub id: String,

    /// Derived from the id, never written to the document
    #[serde(rename = "type")]
    pub kind: ObjectKind,

    pub title: String,
    pub status: ObjectStatus,
    pub priority: Priority,

    /// Containing object, absent for projects and standalone features/tasks
    pub parent: Option<String>,

    /// Ids that should close before this object is claimable
    pub prerequisites: Vec<String>,

    /// File path -> description of changes made while working this object
    pub affected_files: BTreeMap<String, String>,

    /// Append-only audit trail
    pub log: Vec<String>,

    pub schema: String,

    /// Ids of contained objects, in creation order
    pub children_ids: Vec<String>,

    pub created: String,
    pub updated: String,

    /// Free-form document body
    pub body: String,
}

impl TrellisObject {
    /// Creates a new open object, validating the id
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        let kind = ObjectKind::from_id(&id)?;
        let now = timestamp_now();

        Ok(Self {
            id,
            kind,
            title: title.into(),
            status: ObjectStatus::Open,
            priority: Priority::Medium,
            parent: None,
            prerequisites: Vec::new(),
            affected_files: BTreeMap::new(),
            log: Vec::new(),
            schema: SCHEMA_VERSION.to_string(),
            children_ids: Vec::new(),
            created: now.clone(),
            updated: now,
            body: String::new(),
        })
    }

    /// Builder-style parent setter
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder-style status setter
    pub fn with_status(mut self, status: ObjectStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style priority setter
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder-style prerequisites setter
    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if status is done or wont-do
    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    /// Bumps the `updated` timestamp
    pub fn touch(&mut self) {
        self.updated = timestamp_now();
    }

    /// Transitions to a new status
    pub fn set_status(&mut self, status: ObjectStatus) {
        if self.status != status {
            self.status = status;
            self.touch();
        }
    }

    /// Appends an entry to the log
    pub fn append_log(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
        self.touch();
    }

    /// Merges file descriptions into `affected_files`.
    ///
    /// An existing description is extended with `"; "` and the new text,
    /// even when the new text is empty. Nothing is ever overwritten.
    pub fn append_affected_files<I, K, V>(&mut self, files: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (path, description) in files {
            let description = description.into();
            self.affected_files
                .entry(path.into())
                .and_modify(|existing| {
                    existing.push_str("; ");
                    existing.push_str(&description);
                })
                .or_insert(description);
        }
        self.touch();
    }

    /// Registers a contained object, ignoring duplicates
    pub fn add_child(&mut self, child_id: &str) -> bool {
        if self.children_ids.iter().any(|c| c == child_id) {
            return false;
        }
        self.children_ids.push(child_id.to_string());
        self.touch();
        true
    }

    /// Parses the `updated` timestamp
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.updated)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}
