//! Lifecycle CLI commands: claim, complete, delete, prune

use anyhow::Result;

use super::output::Output;
use crate::engine::{ClaimRequest, CompleteRequest};
use crate::storage::Project;

pub fn claim(
    project: &Project,
    output: &Output,
    id: Option<String>,
    scope: Option<String>,
    force: bool,
) -> Result<()> {
    let request = ClaimRequest {
        task_id: id,
        scope,
        force,
    };
    let task = project.engine().claim_task(&request).into_result()?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Claimed task: {} - {}", task.id, task.title));
    }

    Ok(())
}

pub fn complete(
    project: &Project,
    output: &Output,
    id: &str,
    summary: &str,
    files: Vec<(String, String)>,
    auto_complete_parent: bool,
) -> Result<()> {
    let request = CompleteRequest {
        task_id: id.to_string(),
        summary: summary.to_string(),
        files_changed: files,
        auto_complete_parent: Some(auto_complete_parent),
    };
    let task = project.engine().complete_task(&request).into_result()?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Completed task: {}", task.id));
    }

    Ok(())
}

pub fn delete(project: &Project, output: &Output, id: &str, force: bool) -> Result<()> {
    let object = project.engine().delete_object(id, force).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        output.success(&format!("Deleted {}: {}", object.kind, object.id));
    }

    Ok(())
}

pub fn prune(project: &Project, output: &Output, days: u32, scope: Option<&str>) -> Result<()> {
    let report = project.engine().prune_closed(days, scope).into_result()?;

    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    output.success(&format!(
        "Pruned {} closed object(s) older than {} day(s)",
        report.deleted_count, days
    ));
    for id in &report.deleted_ids {
        println!("  deleted {}", id);
    }
    if report.skipped_count > 0 {
        println!("Skipped {} with open descendants:", report.skipped_count);
        for id in &report.skipped_ids {
            println!("  {}", id);
        }
    }

    Ok(())
}
