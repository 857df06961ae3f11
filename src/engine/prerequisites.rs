//! Prerequisite checks
//!
//! A prerequisite is satisfied when it is closed or when no object with
//! that id exists (external dependencies never block).

use std::collections::HashSet;

use crate::domain::{ObjectStatus, TrellisObject};
use crate::error::Result;
use crate::storage::{ObjectQuery, Repository};

/// Returns true if every direct prerequisite of `object` is satisfied
pub fn check_prerequisites_complete<R: Repository + ?Sized>(
    repo: &R,
    object: &TrellisObject,
) -> Result<bool> {
    for id in &object.prerequisites {
        if let Some(prerequisite) = repo.get_object_by_id(id)? {
            if !prerequisite.is_closed() {
                tracing::debug!(object = %object.id, prerequisite = %id, "prerequisite still open");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Returns true if the object and every ancestor have their prerequisites
/// satisfied.
///
/// Ancestor lookups fail open: a missing ancestor, a failed lookup or a
/// cycle in the parent chain ends the walk as satisfied.
pub fn check_hierarchical_prerequisites_complete<R: Repository + ?Sized>(
    repo: &R,
    object: &TrellisObject,
) -> Result<bool> {
    if !check_prerequisites_complete(repo, object)? {
        return Ok(false);
    }

    let mut visited = HashSet::from([object.id.clone()]);
    let mut next = object.parent.clone();

    while let Some(parent_id) = next {
        if !visited.insert(parent_id.clone()) {
            tracing::warn!(object = %object.id, ancestor = %parent_id, "cycle in parent chain");
            return Ok(true);
        }

        let parent = match repo.get_object_by_id(&parent_id) {
            Ok(Some(parent)) => parent,
            Ok(None) => return Ok(true),
            Err(error) => {
                tracing::warn!(ancestor = %parent_id, error = %error, "ancestor lookup failed");
                return Ok(true);
            }
        };

        match check_prerequisites_complete(repo, &parent) {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(error) => {
                tracing::warn!(ancestor = %parent_id, error = %error, "ancestor prerequisite check failed");
                return Ok(true);
            }
        }

        next = parent.parent;
    }

    Ok(true)
}

/// Returns true if some other non-closed object lists `object` as a
/// prerequisite
pub fn is_required_for_other_objects<R: Repository + ?Sized>(
    repo: &R,
    object: &TrellisObject,
) -> Result<bool> {
    Ok(repo
        .get_objects(&ObjectQuery::everything())?
        .iter()
        .any(|other| {
            other.id != object.id
                && !other.is_closed()
                && other.prerequisites.iter().any(|p| p == &object.id)
        }))
}

/// Drops tasks that cannot be claimed from a candidate set.
///
/// A task is blocked when one of its prerequisites is in the same set and
/// still open. Tasks whose status is not claimable are dropped as well.
/// Prerequisites outside the set are not consulted.
pub fn filter_unavailable(tasks: Vec<TrellisObject>) -> Vec<TrellisObject> {
    let open: HashSet<String> = tasks
        .iter()
        .filter(|t| t.status == ObjectStatus::Open)
        .map(|t| t.id.clone())
        .collect();

    tasks
        .into_iter()
        .filter(|t| t.status.is_claimable())
        .filter(|t| !t.prerequisites.iter().any(|p| open.contains(p)))
        .collect()
}
