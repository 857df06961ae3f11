//! Canonical on-disk locations
//!
//! The directory tree encodes containment and, for tasks, open/closed state:
//!
//! ```text
//! p/<project>/<project>.md
//! p/<project>/e/<epic>/<epic>.md
//! p/<project>/e/<epic>/f/<feature>/<feature>.md
//! p/<project>/e/<epic>/f/<feature>/t/<open|closed>/<task>.md
//! f/<feature>/<feature>.md                       (standalone feature)
//! f/<feature>/t/<open|closed>/<task>.md
//! t/<open|closed>/<task>.md                      (standalone task)
//! ```
//!
//! Paths are recomputed on every save: a task moves between `open` and
//! `closed` whenever its status crosses the closed boundary.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{ObjectKind, TrellisObject};
use crate::error::Result;

/// File extension of object documents
pub const DOCUMENT_EXTENSION: &str = "md";

pub(crate) const PROJECTS_DIR: &str = "p";
pub(crate) const EPICS_DIR: &str = "e";
pub(crate) const FEATURES_DIR: &str = "f";
pub(crate) const TASKS_DIR: &str = "t";
pub(crate) const OPEN_DIR: &str = "open";
pub(crate) const CLOSED_DIR: &str = "closed";

/// An ancestry rule was broken while resolving a path
#[derive(Debug, Error, PartialEq)]
pub enum HierarchyError {
    #[error("Epic {0} must have a parent project")]
    EpicMissingProject(String),

    #[error("Epic {epic} parent {parent} is not a project")]
    EpicParentNotProject { epic: String, parent: String },

    #[error("Parent {parent} of {child} not found")]
    ParentNotFound { child: String, parent: String },

    #[error("Feature {feature} parent {parent} is not an epic")]
    FeatureParentNotEpic { feature: String, parent: String },

    #[error("Epic {epic} (parent of feature {feature}) must have a parent project")]
    FeatureEpicMissingProject { feature: String, epic: String },

    #[error("Task {task} parent {parent} is not a feature")]
    TaskParentNotFeature { task: String, parent: String },

    #[error("Projects cannot have a parent (project {project}, parent {parent})")]
    ProjectHasParent { project: String, parent: String },
}

fn document_name(id: &str) -> String {
    format!("{}.{}", id, DOCUMENT_EXTENSION)
}

/// Resolves the canonical path of an object, relative to the store root.
///
/// `lookup` fetches ancestors by id; it is only consulted for features
/// and tasks with a parent.
pub fn relative_path<F>(object: &TrellisObject, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Result<Option<TrellisObject>>,
{
    match object.kind {
        ObjectKind::Project => {
            if let Some(parent) = &object.parent {
                return Err(HierarchyError::ProjectHasParent {
                    project: object.id.clone(),
                    parent: parent.clone(),
                }
                .into());
            }
            Ok(project_dir(&object.id).join(document_name(&object.id)))
        }
        ObjectKind::Epic => Ok(epic_dir(object)?.join(document_name(&object.id))),
        ObjectKind::Feature => Ok(feature_dir(object, &lookup)?.join(document_name(&object.id))),
        ObjectKind::Task => {
            let state_dir = if object.is_closed() { CLOSED_DIR } else { OPEN_DIR };
            let base = match &object.parent {
                None => PathBuf::new(),
                Some(parent_id) => {
                    let parent = lookup(parent_id)?.ok_or_else(|| HierarchyError::ParentNotFound {
                        child: object.id.clone(),
                        parent: parent_id.clone(),
                    })?;
                    if parent.kind != ObjectKind::Feature {
                        return Err(HierarchyError::TaskParentNotFeature {
                            task: object.id.clone(),
                            parent: parent_id.clone(),
                        }
                        .into());
                    }
                    feature_dir(&parent, &lookup)?
                }
            };
            Ok(base
                .join(TASKS_DIR)
                .join(state_dir)
                .join(document_name(&object.id)))
        }
    }
}

/// Resolves the canonical path of an object under `root`
pub fn resolve_path<F>(root: &Path, object: &TrellisObject, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Result<Option<TrellisObject>>,
{
    Ok(root.join(relative_path(object, lookup)?))
}

fn project_dir(project_id: &str) -> PathBuf {
    PathBuf::from(PROJECTS_DIR).join(project_id)
}

fn epic_dir(epic: &TrellisObject) -> Result<PathBuf> {
    let project_id = epic
        .parent
        .as_ref()
        .ok_or_else(|| HierarchyError::EpicMissingProject(epic.id.clone()))?;

    if ObjectKind::from_id(project_id)? != ObjectKind::Project {
        return Err(HierarchyError::EpicParentNotProject {
            epic: epic.id.clone(),
            parent: project_id.clone(),
        }
        .into());
    }

    Ok(project_dir(project_id).join(EPICS_DIR).join(&epic.id))
}

fn feature_dir<F>(feature: &TrellisObject, lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Result<Option<TrellisObject>>,
{
    let Some(epic_id) = &feature.parent else {
        return Ok(PathBuf::from(FEATURES_DIR).join(&feature.id));
    };

    let epic = lookup(epic_id)?.ok_or_else(|| HierarchyError::ParentNotFound {
        child: feature.id.clone(),
        parent: epic_id.clone(),
    })?;

    if epic.kind != ObjectKind::Epic {
        return Err(HierarchyError::FeatureParentNotEpic {
            feature: feature.id.clone(),
            parent: epic_id.clone(),
        }
        .into());
    }

    if epic.parent.is_none() {
        return Err(HierarchyError::FeatureEpicMissingProject {
            feature: feature.id.clone(),
            epic: epic_id.clone(),
        }
        .into());
    }

    Ok(epic_dir(&epic)?.join(FEATURES_DIR).join(&feature.id))
}
