//! Creating and editing objects outside the claim/complete lifecycle

use std::collections::HashSet;

use chrono::Utc;

use super::prerequisites::check_hierarchical_prerequisites_complete;
use super::{Engine, Outcome};
use crate::domain::{
    generate_id, timestamp_now, ObjectKind, ObjectStatus, Priority, PrerequisiteGraph,
    TrellisObject, SCHEMA_VERSION,
};
use crate::error::{Result, TrellisError};
use crate::storage::{ObjectQuery, Repository};

/// Parameters for [`Engine::create_object`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub kind: ObjectKind,
    pub title: String,
    pub parent: Option<String>,
    pub priority: Priority,

    /// Initial status, draft or open
    pub status: ObjectStatus,
    pub prerequisites: Vec<String>,
    pub body: String,

    /// Explicit id; generated from the title when absent
    pub id: Option<String>,
}

impl CreateRequest {
    pub fn new(kind: ObjectKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            parent: None,
            priority: Priority::default(),
            status: ObjectStatus::Open,
            prerequisites: Vec::new(),
            body: String::new(),
            id: None,
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn status(mut self, status: ObjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn prerequisite(mut self, id: impl Into<String>) -> Self {
        self.prerequisites.push(id.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Field changes for [`Engine::update_object`]; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<ObjectStatus>,
    pub body: Option<String>,
    pub prerequisites: Option<Vec<String>>,
}

impl UpdatePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl<R: Repository> Engine<R> {
    /// Loads one object
    pub fn get_object(&self, id: &str) -> Outcome<TrellisObject> {
        self.repo
            .get_object_by_id(id)
            .and_then(|found| found.ok_or_else(|| TrellisError::NotFound(id.to_string())))
            .into()
    }

    /// Lists objects matching a query
    pub fn list_objects(&self, query: &ObjectQuery) -> Outcome<Vec<TrellisObject>> {
        self.repo.get_objects(query).into()
    }

    /// Creates an object and registers it with its parent
    pub fn create_object(&self, request: &CreateRequest) -> Outcome<TrellisObject> {
        self.try_create_object(request).into()
    }

    fn try_create_object(&self, request: &CreateRequest) -> Result<TrellisObject> {
        if request.title.trim().is_empty() {
            return Err(TrellisError::Validation("Title must not be empty".to_string()));
        }
        if !request.status.is_claimable() {
            return Err(TrellisError::Validation(format!(
                "New objects must start as draft or open, not {}",
                request.status
            )));
        }

        let existing = self.repo.get_objects(&ObjectQuery::everything())?;
        let taken: HashSet<&str> = existing.iter().map(|o| o.id.as_str()).collect();

        let id = match &request.id {
            Some(id) => {
                validate_explicit_id(id, request.kind)?;
                if taken.contains(id.as_str()) {
                    return Err(TrellisError::Validation(format!("Object {} already exists", id)));
                }
                id.clone()
            }
            None => generate_id(request.kind, &request.title, Utc::now(), |c| taken.contains(c)),
        };

        let mut parent = match &request.parent {
            Some(parent_id) => Some(self.repo.get_object_by_id(parent_id)?.ok_or_else(|| {
                TrellisError::Validation(format!("Parent object {} not found", parent_id))
            })?),
            None => None,
        };

        let now = timestamp_now();
        let object = TrellisObject {
            title: request.title.clone(),
            status: request.status,
            priority: request.priority,
            parent: request.parent.clone(),
            prerequisites: request.prerequisites.clone(),
            body: request.body.clone(),
            schema: SCHEMA_VERSION.to_string(),
            created: now.clone(),
            updated: now,
            ..TrellisObject::new(id, "")?
        };

        check_prerequisite_cycles(&existing, &object)?;

        self.repo.save_object(&object)?;
        tracing::debug!(id = %object.id, "created object");

        if let Some(parent) = parent.as_mut() {
            if parent.add_child(&object.id) {
                self.repo.save_object(parent)?;
            }
        }

        Ok(object)
    }

    /// Applies a patch to an object
    pub fn update_object(&self, id: &str, patch: &UpdatePatch, force: bool) -> Outcome<TrellisObject> {
        self.try_update_object(id, patch, force).into()
    }

    fn try_update_object(&self, id: &str, patch: &UpdatePatch, force: bool) -> Result<TrellisObject> {
        let mut object = self
            .repo
            .get_object_by_id(id)?
            .ok_or_else(|| TrellisError::NotFound(id.to_string()))?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(TrellisError::Validation("Title must not be empty".to_string()));
            }
            object.title = title.clone();
        }
        if let Some(priority) = patch.priority {
            object.priority = priority;
        }
        if let Some(body) = &patch.body {
            object.body = body.clone();
        }

        if let Some(prerequisites) = &patch.prerequisites {
            object.prerequisites = prerequisites.clone();
            let existing = self.repo.get_objects(&ObjectQuery::everything())?;
            check_prerequisite_cycles(&existing, &object)?;
        }

        if let Some(status) = patch.status {
            if status != object.status {
                self.check_status_change(&object, status, force)?;
                object.status = status;
            }
        }

        object.touch();
        self.repo.save_object(&object)?;
        tracing::debug!(id = %object.id, "updated object");
        Ok(object)
    }

    fn check_status_change(&self, object: &TrellisObject, status: ObjectStatus, force: bool) -> Result<()> {
        if !matches!(status, ObjectStatus::InProgress | ObjectStatus::Done) {
            return Ok(());
        }

        if !force {
            let hint = if status == ObjectStatus::Done { "complete" } else { "claim" };
            return Err(TrellisError::Validation(format!(
                "Moving {} to {} is a lifecycle transition; use {} or pass force",
                object.id, status, hint
            )));
        }

        if status == ObjectStatus::InProgress
            && !object.prerequisites.is_empty()
            && !check_hierarchical_prerequisites_complete(&self.repo, object)?
        {
            return Err(TrellisError::Dependency(format!(
                "Cannot start {}: prerequisites are not complete",
                object.id
            )));
        }

        Ok(())
    }

    /// Appends a log entry
    pub fn append_object_log(&self, id: &str, entry: &str) -> Outcome<TrellisObject> {
        self.edit(id, |object| object.append_log(entry)).into()
    }

    /// Merges file descriptions into an object's affected files
    pub fn append_affected_files(&self, id: &str, files: &[(String, String)]) -> Outcome<TrellisObject> {
        self.edit(id, |object| object.append_affected_files(files.iter().cloned()))
            .into()
    }

    fn edit(&self, id: &str, change: impl FnOnce(&mut TrellisObject)) -> Result<TrellisObject> {
        let mut object = self
            .repo
            .get_object_by_id(id)?
            .ok_or_else(|| TrellisError::NotFound(id.to_string()))?;
        change(&mut object);
        self.repo.save_object(&object)?;
        Ok(object)
    }

    /// Previews what would be worked next, without claiming it
    pub fn next_available(&self, kind: Option<ObjectKind>, scope: Option<&str>) -> Outcome<TrellisObject> {
        self.try_next_available(kind.unwrap_or(ObjectKind::Task), scope)
            .into()
    }

    fn try_next_available(&self, kind: ObjectKind, scope: Option<&str>) -> Result<TrellisObject> {
        let query = ObjectQuery::default().kind(kind).scope(scope);
        let mut ready = Vec::new();

        for object in self.repo.get_objects(&query)? {
            if !object.status.is_claimable() {
                continue;
            }
            match check_hierarchical_prerequisites_complete(&self.repo, &object) {
                Ok(true) => ready.push(object),
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(id = %object.id, error = %error, "prerequisite check failed, skipping");
                }
            }
        }

        ready.sort_by_key(|o| o.priority.rank());
        ready
            .into_iter()
            .next()
            .ok_or_else(|| TrellisError::NoneAvailable(format!("No available {} objects", kind)))
    }
}

fn validate_explicit_id(id: &str, kind: ObjectKind) -> Result<()> {
    let actual = ObjectKind::from_id(id)?;
    if actual != kind {
        return Err(TrellisError::Validation(format!(
            "Id {} has a {} prefix, expected {}",
            id,
            actual,
            kind.prefix()
        )));
    }
    if id.len() <= 2 || id.chars().any(|c| c == '/' || c == '\\' || c.is_whitespace()) {
        return Err(TrellisError::Validation(format!("Invalid object id: {}", id)));
    }
    Ok(())
}

/// Rejects prerequisites that would close a cycle through the store
fn check_prerequisite_cycles(existing: &[TrellisObject], object: &TrellisObject) -> Result<()> {
    let objects = existing
        .iter()
        .filter(|o| o.id != object.id)
        .chain(std::iter::once(object));
    PrerequisiteGraph::from_objects(objects)?;
    Ok(())
}
