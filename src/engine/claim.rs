//! Claiming tasks
//!
//! A claim moves one task to in-progress, then marks its ancestors
//! in-progress so the hierarchy reflects active work.

use std::collections::HashSet;

use super::prerequisites::{check_prerequisites_complete, filter_unavailable};
use super::{Engine, Outcome};
use crate::domain::{ObjectKind, ObjectStatus, TrellisObject};
use crate::error::{Result, TrellisError};
use crate::storage::{ObjectQuery, Repository};

/// Parameters for [`Engine::claim_task`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimRequest {
    /// Claim this task instead of discovering one
    pub task_id: Option<String>,

    /// Restrict discovery to a subtree
    pub scope: Option<String>,

    /// Skip the status and prerequisite checks on the by-id path
    pub force: bool,
}

impl ClaimRequest {
    pub fn by_id(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::default()
        }
    }

    pub fn in_scope(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            ..Self::default()
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

impl<R: Repository> Engine<R> {
    /// Claims a task and marks its ancestors in-progress
    pub fn claim_task(&self, request: &ClaimRequest) -> Outcome<TrellisObject> {
        self.try_claim_task(request).into()
    }

    fn try_claim_task(&self, request: &ClaimRequest) -> Result<TrellisObject> {
        let mut task = match &request.task_id {
            Some(id) => self.claimable_by_id(id, request.force)?,
            None => self.discover_task(request.scope.as_deref())?,
        };

        task.set_status(ObjectStatus::InProgress);
        self.repo.save_object(&task)?;
        tracing::debug!(id = %task.id, "claimed task");

        self.propagate_in_progress(&task);
        Ok(task)
    }

    /// Loads a task for an explicit claim. Uses the flat prerequisite check.
    fn claimable_by_id(&self, id: &str, force: bool) -> Result<TrellisObject> {
        let task = self
            .repo
            .get_object_by_id(id)?
            .ok_or_else(|| TrellisError::NotFound(id.to_string()))?;

        if task.kind != ObjectKind::Task {
            return Err(TrellisError::Validation(format!(
                "Object {} is not a task (type: {})",
                id, task.kind
            )));
        }

        if !force {
            if !task.status.is_claimable() {
                return Err(TrellisError::Validation(format!(
                    "Task {} is not available to claim (current status: {})",
                    id, task.status
                )));
            }
            if !check_prerequisites_complete(&self.repo, &task)? {
                return Err(TrellisError::Dependency(format!(
                    "Task {} has incomplete prerequisites",
                    id
                )));
            }
        }

        Ok(task)
    }

    /// Picks the highest-priority available task in scope
    fn discover_task(&self, scope: Option<&str>) -> Result<TrellisObject> {
        let query = ObjectQuery::default().kind(ObjectKind::Task).scope(scope);
        let mut available = filter_unavailable(self.repo.get_objects(&query)?);

        // Stable: ties keep scan order
        available.sort_by_key(|t| t.priority.rank());

        available.into_iter().next().ok_or_else(|| {
            TrellisError::NoneAvailable(match scope {
                Some(scope) => format!("No available tasks in scope {}", scope),
                None => "No available tasks".to_string(),
            })
        })
    }

    /// Marks ancestors in-progress until one already is. Failures are logged
    /// and never fail the claim.
    fn propagate_in_progress(&self, task: &TrellisObject) {
        let mut visited = HashSet::from([task.id.clone()]);
        let mut next = task.parent.clone();

        while let Some(parent_id) = next {
            if !visited.insert(parent_id.clone()) {
                tracing::warn!(task = %task.id, ancestor = %parent_id, "cycle in parent chain");
                return;
            }

            let mut parent = match self.repo.get_object_by_id(&parent_id) {
                Ok(Some(parent)) => parent,
                Ok(None) => return,
                Err(error) => {
                    tracing::warn!(ancestor = %parent_id, error = %error, "failed to load ancestor for claim propagation");
                    return;
                }
            };

            if parent.status == ObjectStatus::InProgress {
                return;
            }

            parent.set_status(ObjectStatus::InProgress);
            if let Err(error) = self.repo.save_object(&parent) {
                tracing::warn!(ancestor = %parent_id, error = %error, "failed to mark ancestor in-progress");
                return;
            }

            next = parent.parent;
        }
    }
}
