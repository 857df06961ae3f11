//! Deletion and age-based pruning

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{Engine, Outcome};
use crate::domain::TrellisObject;
use crate::error::Result;
use crate::storage::{ObjectQuery, Repository};

/// What a prune run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub deleted_count: usize,
    pub deleted_ids: Vec<String>,

    /// Closed objects kept because something below them is still open
    pub skipped_count: usize,
    pub skipped_ids: Vec<String>,
}

impl<R: Repository> Engine<R> {
    /// Deletes a single object.
    ///
    /// Without `force`, refuses to delete an object that a non-closed
    /// object still lists as a prerequisite. Deleting a project, epic or
    /// feature removes everything below it.
    pub fn delete_object(&self, id: &str, force: bool) -> Outcome<TrellisObject> {
        self.repo.delete_object(id, force).into()
    }

    /// Deletes closed objects last updated more than `age_days` ago
    pub fn prune_closed(&self, age_days: u32, scope: Option<&str>) -> Outcome<PruneReport> {
        self.prune_closed_at(age_days, scope, Utc::now()).into()
    }

    /// [`Engine::prune_closed`] against a fixed clock
    pub fn prune_closed_at(
        &self,
        age_days: u32,
        scope: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PruneReport> {
        // Nothing predates chrono's minimum date
        let Some(cutoff) = Duration::try_days(i64::from(age_days))
            .and_then(|age| now.checked_sub_signed(age))
        else {
            tracing::debug!(age_days, "cutoff before the earliest representable date");
            return Ok(PruneReport::default());
        };
        let query = ObjectQuery::everything().scope(scope);

        let candidates: Vec<TrellisObject> = self
            .repo
            .get_objects(&query)?
            .into_iter()
            .filter(|o| o.is_closed())
            .filter(|o| match o.updated_at() {
                Some(updated) => updated < cutoff,
                None => {
                    tracing::debug!(id = %o.id, updated = %o.updated, "unparsable timestamp, not pruning");
                    false
                }
            })
            .collect();

        let mut report = PruneReport::default();
        let mut doomed = Vec::new();

        for candidate in candidates {
            let blocked = self.has_open_descendant(&candidate.id).unwrap_or_else(|error| {
                tracing::warn!(id = %candidate.id, error = %error, "descendant check failed, skipping");
                true
            });

            if blocked {
                report.skipped_ids.push(candidate.id);
            } else {
                doomed.push(candidate);
            }
        }

        // Leaves first, so a folder removal never pulls a later candidate out
        // from under us
        doomed.sort_by_key(|o| Reverse(o.kind));

        for object in doomed {
            match self.repo.delete_object(&object.id, true) {
                Ok(_) => report.deleted_ids.push(object.id),
                Err(error) => {
                    tracing::warn!(id = %object.id, error = %error, "failed to prune object");
                }
            }
        }

        report.deleted_count = report.deleted_ids.len();
        report.skipped_count = report.skipped_ids.len();
        tracing::debug!(deleted = report.deleted_count, skipped = report.skipped_count, "prune finished");
        Ok(report)
    }

    fn has_open_descendant(&self, id: &str) -> Result<bool> {
        let mut visited = HashSet::from([id.to_string()]);
        let mut stack = vec![id.to_string()];

        while let Some(current) = stack.pop() {
            for child in self.repo.get_children_of(&current, true)? {
                if !child.is_closed() {
                    return Ok(true);
                }
                if visited.insert(child.id.clone()) {
                    stack.push(child.id);
                }
            }
        }

        Ok(false)
    }
}
