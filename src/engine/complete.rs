//! Completing tasks, with optional parent auto-completion

use std::collections::HashSet;

use super::{Engine, Outcome};
use crate::domain::{ObjectKind, ObjectStatus, TrellisObject};
use crate::error::{Result, TrellisError};
use crate::storage::Repository;

/// Parameters for [`Engine::complete_task`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompleteRequest {
    pub task_id: String,

    /// Appended to the task log
    pub summary: String,

    /// Path -> description, merged into the task's affected files
    pub files_changed: Vec<(String, String)>,

    /// Overrides the engine's auto-complete setting for this call
    pub auto_complete_parent: Option<bool>,
}

impl CompleteRequest {
    pub fn new(task_id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn file(mut self, path: impl Into<String>, description: impl Into<String>) -> Self {
        self.files_changed.push((path.into(), description.into()));
        self
    }

    pub fn auto_complete_parent(mut self, enabled: bool) -> Self {
        self.auto_complete_parent = Some(enabled);
        self
    }
}

impl<R: Repository> Engine<R> {
    /// Marks an in-progress task done
    pub fn complete_task(&self, request: &CompleteRequest) -> Outcome<TrellisObject> {
        self.try_complete_task(request).into()
    }

    fn try_complete_task(&self, request: &CompleteRequest) -> Result<TrellisObject> {
        let id = &request.task_id;
        let mut task = self
            .repo
            .get_object_by_id(id)?
            .ok_or_else(|| TrellisError::NotFound(id.clone()))?;

        if task.kind != ObjectKind::Task {
            return Err(TrellisError::Validation(format!(
                "Object {} is not a task (type: {})",
                id, task.kind
            )));
        }

        if task.status != ObjectStatus::InProgress {
            return Err(TrellisError::Validation(format!(
                "Task {} is not in progress (current status: {})",
                id, task.status
            )));
        }

        task.set_status(ObjectStatus::Done);
        task.append_affected_files(request.files_changed.iter().cloned());
        task.append_log(request.summary.clone());
        self.repo.save_object(&task)?;
        tracing::debug!(id = %task.id, "completed task");

        let auto = request
            .auto_complete_parent
            .unwrap_or(self.options.auto_complete_parent);
        if auto {
            if let Err(error) = self.auto_complete_parents(&task) {
                tracing::warn!(task = %task.id, error = %error, "parent auto-completion stopped");
            }
        }

        Ok(task)
    }

    /// Closes ancestors whose children are all closed, nearest first
    fn auto_complete_parents(&self, task: &TrellisObject) -> Result<()> {
        let mut visited = HashSet::from([task.id.clone()]);
        let mut next = task.parent.clone();

        while let Some(parent_id) = next {
            if !visited.insert(parent_id.clone()) {
                return Ok(());
            }

            let Some(mut parent) = self.repo.get_object_by_id(&parent_id)? else {
                return Ok(());
            };
            if parent.is_closed() {
                return Ok(());
            }

            let children = self.children_for_completion(&parent)?;
            if children.is_empty() || children.iter().any(|c| !c.is_closed()) {
                return Ok(());
            }

            let label = parent.kind.child_label().unwrap_or("objects");
            parent.set_status(ObjectStatus::Done);
            parent.append_log(format!("Auto-completed: All child {} are complete", label));
            self.repo.save_object(&parent)?;
            tracing::debug!(id = %parent.id, "auto-completed parent");

            next = parent.parent;
        }

        Ok(())
    }

    /// Resolves declared children, or discovers them when none are declared
    fn children_for_completion(&self, parent: &TrellisObject) -> Result<Vec<TrellisObject>> {
        if parent.children_ids.is_empty() {
            return self.repo.get_children_of(&parent.id, true);
        }

        let mut children = Vec::with_capacity(parent.children_ids.len());
        for id in &parent.children_ids {
            match self.repo.get_object_by_id(id)? {
                Some(child) => children.push(child),
                None => tracing::debug!(parent = %parent.id, child = %id, "declared child not found"),
            }
        }
        Ok(children)
    }
}
